//! View name inference.
//!
//! Given an action's fully-qualified name and its slice, an inferrer returns
//! the ordered container keys to try for the action's view. The first key the
//! slice container knows wins.

use crate::slice::Slice;

/// A strategy producing candidate view identifiers for an action.
pub trait ViewNameInferrer: Send + Sync {
    fn call(&self, action_name: &str, slice: &Slice) -> Vec<String>;
}

impl<F> ViewNameInferrer for F
where
    F: Fn(&str, &Slice) -> Vec<String> + Send + Sync,
{
    fn call(&self, action_name: &str, slice: &Slice) -> Vec<String> {
        self(action_name, slice)
    }
}

/// Actions whose view is commonly shared with another action's.
const ALTERNATIVE_NAMES: [(&str, &str); 2] = [("create", "new"), ("update", "edit")];

/// Maps `Main::Actions::Books::Create` in slice `main` to
/// `["views.books.create", "views.books.new"]`.
///
/// The `actions` and `views` segments come from the slice's
/// `name_inference_base` and `view_name_inference_base` settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardViewNameInferrer;

impl ViewNameInferrer for StandardViewNameInferrer {
    fn call(&self, action_name: &str, slice: &Slice) -> Vec<String> {
        let (action_base, view_base) = {
            let actions = slice.actions_config();
            (
                actions.name_inference_base().as_str().unwrap_or_default().to_string(),
                actions.view_name_inference_base().as_str().unwrap_or_default().to_string(),
            )
        };

        let path = slice.inflector().underscore_path(action_name, ".");
        let relative = strip_segment(&path, slice.name());
        let relative = strip_segment(relative, &action_base);

        let view_name = join(&view_base, relative);
        let mut candidates = vec![view_name];

        let (parent, last) = match relative.rsplit_once('.') {
            Some((parent, last)) => (Some(parent), last),
            None => (None, relative),
        };
        if let Some((_, alternative)) = ALTERNATIVE_NAMES.iter().find(|(name, _)| *name == last) {
            let alternative = match parent {
                Some(parent) => format!("{parent}.{alternative}"),
                None => (*alternative).to_string(),
            };
            candidates.push(join(&view_base, &alternative));
        }
        candidates
    }
}

fn strip_segment<'a>(path: &'a str, segment: &str) -> &'a str {
    if segment.is_empty() {
        return path;
    }
    path.strip_prefix(segment)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(path)
}

fn join(base: &str, rest: &str) -> String {
    if base.is_empty() {
        rest.to_string()
    } else {
        format!("{base}.{rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Application;
    use crate::config::Env;
    use std::sync::Arc;

    fn main_slice() -> Arc<Slice> {
        let app = Application::with_env("bookshelf", Env::default());
        app.register_slice("main").unwrap().unwrap()
    }

    #[test]
    fn strips_slice_and_action_base() {
        let slice = main_slice();
        let candidates = StandardViewNameInferrer.call("Main::Actions::Home::Show", &slice);
        assert_eq!(candidates, ["views.home.show"]);
    }

    #[test]
    fn create_and_update_offer_alternatives() {
        let slice = main_slice();
        assert_eq!(
            StandardViewNameInferrer.call("Main::Actions::BookReviews::Create", &slice),
            ["views.book_reviews.create", "views.book_reviews.new"]
        );
        assert_eq!(
            StandardViewNameInferrer.call("Main::Actions::Books::Update", &slice),
            ["views.books.update", "views.books.edit"]
        );
    }

    #[test]
    fn inference_bases_are_configurable() {
        let slice = main_slice();
        slice
            .configure_actions(|actions| actions.set_view_name_inference_base("templates"))
            .unwrap();
        assert_eq!(
            StandardViewNameInferrer.call("Main::Actions::Home::Show", &slice),
            ["templates.home.show"]
        );
    }

    #[test]
    fn closures_are_inferrers() {
        let slice = main_slice();
        let inferrer = |name: &str, _: &Slice| vec![name.to_lowercase()];
        assert_eq!(inferrer.call("Show", &slice), ["show"]);
    }
}
