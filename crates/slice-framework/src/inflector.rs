//! Name inflection and slice names.

use heck::{ToSnakeCase, ToUpperCamelCase};
use std::fmt;

/// String inflections used for slice names and view inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inflector;

impl Inflector {
    pub fn new() -> Self {
        Self
    }

    /// `BookShelf` → `book_shelf`
    pub fn underscore(&self, input: &str) -> String {
        input.to_snake_case()
    }

    /// `book_shelf` → `BookShelf`
    pub fn camelize(&self, input: &str) -> String {
        input.to_upper_camel_case()
    }

    /// Underscores each `::` segment of a path and joins them with `sep`.
    pub fn underscore_path(&self, path: &str, sep: &str) -> String {
        path.split("::")
            .filter(|segment| !segment.is_empty())
            .map(|segment| self.underscore(segment))
            .collect::<Vec<_>>()
            .join(sep)
    }
}

/// The name of a slice (or of the application itself).
///
/// Built from either a plain name (`main`) or a namespace path (`MyApp::App`),
/// in which case the first segment names the slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceName {
    name: String,
    namespace: String,
}

impl SliceName {
    pub fn new(input: &str, inflector: &Inflector) -> Self {
        let head = input.split("::").next().unwrap_or(input);
        let name = inflector.underscore(head);
        let namespace = inflector.camelize(&name);
        Self { name, namespace }
    }

    pub fn with_namespace(input: &str, namespace: &str, inflector: &Inflector) -> Self {
        Self {
            name: inflector.underscore(input),
            namespace: namespace.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for SliceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for SliceName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_name_from_application_path() {
        let name = SliceName::new("MyApp::App", &Inflector::new());
        assert_eq!(name.as_str(), "my_app");
        assert_eq!(name.namespace(), "MyApp");
    }

    #[test]
    fn slice_name_from_plain_name() {
        let name = SliceName::new("admin", &Inflector::new());
        assert_eq!(name.to_string(), "admin");
        assert_eq!(name.namespace(), "Admin");
    }

    #[test]
    fn underscore_path_joins_segments() {
        let inflector = Inflector::new();
        assert_eq!(
            inflector.underscore_path("Main::Actions::BookReviews::Show", "."),
            "main.actions.book_reviews.show"
        );
    }
}
