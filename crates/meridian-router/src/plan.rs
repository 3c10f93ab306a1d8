//! Per-route argument resolution plans.

use indexmap::IndexMap;
use meridian_core::{
    ApiError, Arguments, DispatchError, DispatchRequest, DispatchResult, SetupError,
};

use crate::fetch::FetchDescriptor;
use crate::template::{Converter, PathTemplate};

/// Where a path argument's value comes from.
#[derive(Debug, Clone)]
pub enum ParamSource {
    /// The captured string, passed as-is.
    Raw,
    /// The captured string parsed as an `i64` (`{name:int}`).
    Integer,
    /// An object lookup keyed by the captured string.
    Fetch(FetchDescriptor),
}

/// The checked mapping from path parameters to argument sources.
///
/// Built once when a route is registered; every path parameter is known to
/// be a handler parameter, and every fetch rule names a path parameter.
#[derive(Debug, Clone, Default)]
pub struct ArgumentPlan {
    entries: Vec<(String, ParamSource)>,
}

impl ArgumentPlan {
    /// Validates a route's parameters and builds its plan.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UndeclaredPathParam`] if a path parameter is not
    /// a handler parameter, and [`SetupError::FetchWithoutPathParam`] if a
    /// fetch rule names something other than a path parameter.
    ///
    /// Fetch rules on `int` parameters look up by integer.
    pub fn build(
        route: &str,
        template: &PathTemplate,
        handler_params: &[String],
        fetch: &IndexMap<String, FetchDescriptor>,
    ) -> Result<Self, SetupError> {
        let path_params = template.params();
        if let Some(param) = path_params
            .iter()
            .find(|p| !handler_params.iter().any(|h| h == *p))
        {
            return Err(SetupError::UndeclaredPathParam {
                route: route.to_string(),
                param: param.clone(),
            });
        }

        if let Some(param) = fetch
            .keys()
            .find(|name| !path_params.iter().any(|p| p == *name))
        {
            return Err(SetupError::FetchWithoutPathParam {
                route: route.to_string(),
                param: param.clone(),
            });
        }

        let entries = path_params
            .iter()
            .map(|param| {
                let int = template.converter(param) == Some(Converter::Int);
                let source = match (fetch.get(param), int) {
                    (Some(descriptor), true) => ParamSource::Fetch(descriptor.clone().integer_key()),
                    (Some(descriptor), false) => ParamSource::Fetch(descriptor.clone()),
                    (None, true) => ParamSource::Integer,
                    (None, false) => ParamSource::Raw,
                };
                (param.clone(), source)
            })
            .collect();
        Ok(Self { entries })
    }

    /// Returns the planned parameters in template order.
    pub fn entries(&self) -> &[(String, ParamSource)] {
        &self.entries
    }

    /// Resolves every path argument of `request`.
    ///
    /// Lookups run in template order; the first failure aborts resolution.
    pub async fn resolve(&self, request: &DispatchRequest) -> DispatchResult<Arguments> {
        let mut args = Arguments::new();
        for (param, source) in &self.entries {
            let raw = request
                .path_param(param)
                .ok_or_else(|| DispatchError::argument(param.as_str(), "not captured from the path"))?;
            match source {
                ParamSource::Raw => args.insert(param.as_str(), raw.to_string()),
                ParamSource::Integer => {
                    let value: i64 = raw.parse().map_err(|_| {
                        ApiError::bad_request(
                            "parameter.invalid",
                            format!("`{param}` must be an integer, got `{raw}`"),
                        )
                    })?;
                    args.insert(param.as_str(), value);
                }
                ParamSource::Fetch(descriptor) => {
                    let value = descriptor.resolve(param, raw).await?;
                    args.insert_boxed(param.as_str(), value);
                }
            }
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use meridian_store::MemoryStore;
    use serde_json::{json, Value};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn template(raw: &str) -> PathTemplate {
        PathTemplate::parse("r", raw).unwrap()
    }

    #[test]
    fn test_undeclared_path_param() {
        let err = ArgumentPlan::build("r", &template("/u/{id}"), &names(&["user"]), &IndexMap::new())
            .unwrap_err();
        assert_eq!(
            err,
            SetupError::UndeclaredPathParam {
                route: "r".into(),
                param: "id".into()
            }
        );
    }

    #[test]
    fn test_fetch_without_path_param() {
        let table = MemoryStore::new().database("db").create_table::<Value>("t", "id");
        let mut fetch = IndexMap::new();
        fetch.insert("other".to_string(), FetchDescriptor::one(&table));

        let err = ArgumentPlan::build("r", &template("/u/{id}"), &names(&["id", "other"]), &fetch)
            .unwrap_err();
        assert!(matches!(err, SetupError::FetchWithoutPathParam { param, .. } if param == "other"));
    }

    #[test]
    fn test_extra_handler_params_are_allowed() {
        let plan = ArgumentPlan::build("r", &template("/u/{id}"), &names(&["id", "me"]), &IndexMap::new())
            .unwrap();
        assert_eq!(plan.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_raw_and_fetched() {
        let table = MemoryStore::new().database("db").create_table::<Value>("users", "id");
        table.insert(&json!({"id": "u1", "name": "ada"})).await.unwrap();

        let mut fetch = IndexMap::new();
        fetch.insert("user".to_string(), FetchDescriptor::one(&table).key("id"));
        let plan = ArgumentPlan::build(
            "r",
            &template("/u/{user}/{tab}"),
            &names(&["user", "tab"]),
            &fetch,
        )
        .unwrap();

        let request = DispatchRequest::new(Method::GET, "/u/u1/posts".parse().unwrap())
            .with_path_param("user", "u1")
            .with_path_param("tab", "posts");
        let mut args = plan.resolve(&request).await.unwrap();

        assert_eq!(args.take::<String>("tab").unwrap(), "posts");
        assert_eq!(args.take::<Value>("user").unwrap()["name"], "ada");
    }

    #[tokio::test]
    async fn test_int_params_are_converted() {
        let table = MemoryStore::new().database("db").create_table::<Value>("items", "id");
        table.insert(&json!({"id": 7, "name": "lamp"})).await.unwrap();

        let mut fetch = IndexMap::new();
        fetch.insert("item".to_string(), FetchDescriptor::one(&table).key("id"));
        let plan = ArgumentPlan::build(
            "r",
            &template("/shelves/{shelf:int}/items/{item:int}"),
            &names(&["shelf", "item"]),
            &fetch,
        )
        .unwrap();

        let request = DispatchRequest::new(Method::GET, "/shelves/3/items/7".parse().unwrap())
            .with_path_param("shelf", "3")
            .with_path_param("item", "7");
        let mut args = plan.resolve(&request).await.unwrap();
        assert_eq!(args.take::<i64>("shelf").unwrap(), 3);
        assert_eq!(args.take::<Value>("item").unwrap()["name"], "lamp");

        let request = DispatchRequest::new(Method::GET, "/shelves/x/items/7".parse().unwrap())
            .with_path_param("shelf", "x")
            .with_path_param("item", "7");
        let err = plan.resolve(&request).await.unwrap_err();
        assert!(matches!(&err, DispatchError::Api(api) if api.code() == "parameter.invalid"));
    }
}
