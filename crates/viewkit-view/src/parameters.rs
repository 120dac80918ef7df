//! Parameter builder for components

use crate::ViewError;
use serde::Serialize;
use tera::Context;

/// Named parameters passed to a component
///
/// A fluent builder over the template context, so simple components do not
/// need a dedicated struct.
///
/// # Example
///
/// ```rust,ignore
/// use viewkit_view::Parameters;
///
/// let parameters = Parameters::new()
///     .insert("Message", "World")
///     .insert("Count", &3)
///     .insert_if("Admin", &true, |_| user.is_admin());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    context: Context,
}

impl Parameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from the fields of a serializable struct
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, ViewError> {
        let context = Context::from_serialize(value)
            .map_err(|e| ViewError::serialization_error(e.to_string()))?;
        Ok(Self { context })
    }

    /// Insert a parameter
    pub fn insert<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Insert a parameter if a condition is met
    pub fn insert_if<T: Serialize + ?Sized, F>(
        self,
        key: impl Into<String>,
        value: &T,
        condition: F,
    ) -> Self
    where
        F: FnOnce(&T) -> bool,
    {
        if condition(value) {
            self.insert(key, value)
        } else {
            self
        }
    }

    /// Insert a parameter if it's Some
    pub fn insert_some<T: Serialize + ?Sized>(
        self,
        key: impl Into<String>,
        value: Option<&T>,
    ) -> Self {
        match value {
            Some(v) => self.insert(key, v),
            None => self,
        }
    }

    /// Add the fields of a serializable struct
    pub fn extend<T: Serialize>(mut self, value: &T) -> Result<Self, ViewError> {
        let additional = Context::from_serialize(value)
            .map_err(|e| ViewError::serialization_error(e.to_string()))?;
        self.context.extend(additional);
        Ok(self)
    }

    /// Check whether a parameter is set
    pub fn contains(&self, key: &str) -> bool {
        self.context.contains_key(key)
    }

    /// Insert a parameter the renderer supplies, refusing to overwrite one
    /// the caller passed
    pub(crate) fn inject<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), ViewError> {
        if self.contains(key) {
            return Err(ViewError::DuplicateParameter(key.to_string()));
        }
        self.context.insert(key, value);
        Ok(())
    }

    /// The underlying template context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Convert into the template context
    pub fn into_context(self) -> Context {
        self.context
    }
}

impl From<Context> for Parameters {
    fn from(context: Context) -> Self {
        Self { context }
    }
}

impl From<Parameters> for Context {
    fn from(parameters: Parameters) -> Self {
        parameters.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert() {
        let parameters = Parameters::new()
            .insert("name", &"Alice")
            .insert("age", &30);

        assert!(parameters.contains("name"));
        assert!(parameters.contains("age"));
    }

    #[test]
    fn test_insert_if() {
        let show = true;
        let parameters = Parameters::new()
            .insert_if("visible", &"yes", |_| show)
            .insert_if("hidden", &"no", |_| !show);

        assert!(parameters.contains("visible"));
        assert!(!parameters.contains("hidden"));
    }

    #[test]
    fn test_insert_some() {
        let name: Option<&str> = Some("Alice");
        let missing: Option<&str> = None;

        let parameters = Parameters::new()
            .insert_some("name", name)
            .insert_some("missing", missing);

        assert!(parameters.contains("name"));
        assert!(!parameters.contains("missing"));
    }

    #[test]
    fn test_inject_refuses_caller_value() {
        let mut parameters = Parameters::new().insert("Cancel", &false);
        let err = parameters.inject("Cancel", &true).unwrap_err();
        assert!(matches!(err, ViewError::DuplicateParameter(ref key) if key == "Cancel"));

        let mut parameters = Parameters::new();
        parameters.inject("Body", "<p>x</p>").unwrap();
        assert!(parameters.contains("Body"));
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct Page {
            title: String,
        }

        let parameters = Parameters::from_serialize(&Page {
            title: "Home".to_string(),
        })
        .unwrap();
        assert!(parameters.contains("title"));
        assert!(Parameters::from_serialize(&42).is_err());
    }
}
