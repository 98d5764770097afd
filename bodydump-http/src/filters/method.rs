use bodydump_core::Filter;
use http::request::Parts;

/// Skips requests whose method is one of the configured methods.
#[derive(Debug, Clone)]
pub struct Method {
    methods: Vec<http::Method>,
}

impl Method {
    /// Matches a single method.
    pub fn new(method: http::Method) -> Self {
        Self {
            methods: vec![method],
        }
    }

    /// Matches any of several methods.
    pub fn any_of(methods: impl IntoIterator<Item = http::Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }
}

impl Filter<Parts> for Method {
    fn skip(&self, parts: &Parts) -> bool {
        self.methods.contains(&parts.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    #[test]
    fn test_method_matches() {
        let filter = Method::any_of([http::Method::GET, http::Method::HEAD]);
        let (get, _) = Request::get("/").body(()).unwrap().into_parts();
        let (head, _) = Request::head("/").body(()).unwrap().into_parts();
        let (post, _) = Request::post("/").body(()).unwrap().into_parts();

        assert!(filter.skip(&get));
        assert!(filter.skip(&head));
        assert!(!filter.skip(&post));
    }
}
