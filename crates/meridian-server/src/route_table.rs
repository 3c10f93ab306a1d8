//! Path matching over the frozen router tree.

use std::collections::HashMap;

use http::Method;
use indexmap::IndexMap;
use meridian_core::{ApiError, SetupError};
use meridian_router::{PathTemplate, RouteId, RouterTree};

/// Outcome of looking up a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteLookup {
    /// A route matched; parameters are percent-decoded.
    Found {
        /// The matched route.
        route: RouteId,
        /// Captured path parameters in template order.
        params: IndexMap<String, String>,
    },
    /// The path exists under other methods.
    MethodNotAllowed(Vec<Method>),
    /// Nothing matches the path.
    NotFound,
}

struct Target {
    route: RouteId,
    template: PathTemplate,
}

/// One `matchit` router per HTTP method.
///
/// A path whose captures fail their converters (`{n:int}` against `abc`)
/// does not match.
#[derive(Default)]
pub struct RouteTable {
    methods: HashMap<Method, matchit::Router<Target>>,
}

impl RouteTable {
    /// Registers every route of the tree.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidTemplate`] when two templates under the
    /// same method cannot coexist.
    pub fn build(tree: &RouterTree) -> Result<Self, SetupError> {
        let mut table = Self::default();
        for route in tree.routes() {
            table
                .methods
                .entry(route.method().clone())
                .or_default()
                .insert(
                    route.template().matcher_pattern(),
                    Target {
                        route: route.id(),
                        template: route.template().clone(),
                    },
                )
                .map_err(|e| SetupError::InvalidTemplate {
                    route: route.name(),
                    reason: e.to_string(),
                })?;
        }
        Ok(table)
    }

    /// Looks up `path` under `method`.
    ///
    /// # Errors
    ///
    /// Returns a `parameter.invalid` API error when a captured segment does
    /// not percent-decode to UTF-8.
    pub fn lookup(&self, method: &Method, path: &str) -> Result<RouteLookup, ApiError> {
        if let Some(router) = self.methods.get(method) {
            if let Some((route, params)) = match_path(router, path)? {
                return Ok(RouteLookup::Found { route, params });
            }
        }

        let mut allowed = Vec::new();
        for (m, router) in &self.methods {
            if m != method && match_path(router, path)?.is_some() {
                allowed.push(m.clone());
            }
        }
        if allowed.is_empty() {
            return Ok(RouteLookup::NotFound);
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(RouteLookup::MethodNotAllowed(allowed))
    }

    /// Number of registered methods.
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

fn match_path(
    router: &matchit::Router<Target>,
    path: &str,
) -> Result<Option<(RouteId, IndexMap<String, String>)>, ApiError> {
    let Ok(matched) = router.at(path) else {
        return Ok(None);
    };
    let mut params = IndexMap::with_capacity(matched.params.len());
    for (name, raw) in matched.params.iter() {
        let value = urlencoding::decode(raw).map_err(|_| {
            ApiError::bad_request("parameter.invalid", format!("{name}: not valid UTF-8"))
        })?;
        params.insert(name.to_string(), value.into_owned());
    }
    let target = matched.value;
    if !target
        .template
        .accepts(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    {
        return Ok(None);
    }
    Ok(Some((target.route, params)))
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
