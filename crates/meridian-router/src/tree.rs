//! The frozen router tree.
//!
//! Routers are flattened into an arena in depth-first order. Parent links
//! are indices, so inheritance is a walk up the arena.

use std::collections::HashSet;
use std::sync::Arc;

use meridian_core::SetupError;
use meridian_middleware::{ErrorHandler, Service};

use crate::route::{join_paths, CompiledRoute};
use crate::router::Router;

/// Index of a router in a [`RouterTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouterId(usize);

impl RouterId {
    /// The root router.
    pub const ROOT: Self = Self(0);

    /// Returns the arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a route in a [`RouterTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(usize);

impl RouteId {
    /// Returns the arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One router of a frozen tree.
#[derive(Debug)]
pub struct RouterNode {
    name: Option<String>,
    prefix: String,
    parent: Option<RouterId>,
    children: Vec<RouterId>,
    routes: Vec<RouteId>,
    services: Vec<Arc<Service>>,
    error_handlers: Vec<Arc<ErrorHandler>>,
}

impl RouterNode {
    /// Returns the router name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the full path prefix, ancestors included.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the parent, or `None` for the root.
    pub fn parent(&self) -> Option<RouterId> {
        self.parent
    }

    /// Returns the child routers in registration order.
    pub fn children(&self) -> &[RouterId] {
        &self.children
    }

    /// Returns the routes registered directly on this router.
    pub fn routes(&self) -> &[RouteId] {
        &self.routes
    }

    /// Returns this router's own services.
    pub fn services(&self) -> &[Arc<Service>] {
        &self.services
    }

    /// Returns this router's own error handlers.
    pub fn error_handlers(&self) -> &[Arc<ErrorHandler>] {
        &self.error_handlers
    }
}

/// An immutable router tree with compiled routes.
#[derive(Debug)]
pub struct RouterTree {
    nodes: Vec<RouterNode>,
    routes: Vec<Arc<CompiledRoute>>,
}

impl RouterTree {
    pub(crate) fn build(root: Router) -> Result<Self, SetupError> {
        let mut tree = Self {
            nodes: Vec::new(),
            routes: Vec::new(),
        };
        let mut seen = HashSet::new();
        tree.insert(root, None, &mut seen)?;
        tracing::debug!(
            routers = tree.nodes.len(),
            routes = tree.routes.len(),
            "router tree frozen"
        );
        Ok(tree)
    }

    fn insert(
        &mut self,
        router: Router,
        parent: Option<RouterId>,
        seen: &mut HashSet<(String, String)>,
    ) -> Result<RouterId, SetupError> {
        let id = RouterId(self.nodes.len());
        let parent_prefix = parent.map_or("", |p| self.nodes[p.0].prefix.as_str());
        let prefix = if router.prefix.is_empty() {
            parent_prefix.to_string()
        } else {
            join_paths(parent_prefix, &router.prefix)
        };

        self.nodes.push(RouterNode {
            name: router.name,
            prefix,
            parent,
            children: Vec::new(),
            routes: Vec::new(),
            services: router.services,
            error_handlers: router.error_handlers,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }

        let services = self.effective_services(id);
        let error_handlers = self.effective_error_handlers(id);
        for route in router.routes {
            let route_id = RouteId(self.routes.len());
            let compiled = route.compile(
                route_id,
                id,
                &self.nodes[id.0].prefix,
                &services,
                error_handlers.clone(),
            )?;

            let key = (
                compiled.method().to_string(),
                compiled.template().shape().to_string(),
            );
            if !seen.insert(key) {
                return Err(SetupError::DuplicateRoute {
                    method: compiled.method().to_string(),
                    template: compiled.template().as_str().to_string(),
                });
            }

            tracing::debug!(route = %compiled.name(), "route registered");
            self.nodes[id.0].routes.push(route_id);
            self.routes.push(Arc::new(compiled));
        }

        for child in router.children {
            self.insert(child, Some(id), seen)?;
        }
        Ok(id)
    }

    /// Returns the root router id.
    pub fn root(&self) -> RouterId {
        RouterId::ROOT
    }

    /// Returns a router by id.
    pub fn node(&self, id: RouterId) -> Option<&RouterNode> {
        self.nodes.get(id.0)
    }

    /// Returns the parent of `id`.
    pub fn parent(&self, id: RouterId) -> Option<RouterId> {
        self.node(id).and_then(RouterNode::parent)
    }

    /// Returns the children of `id`.
    pub fn children(&self, id: RouterId) -> &[RouterId] {
        self.node(id).map_or(&[], RouterNode::children)
    }

    /// Returns a compiled route by id.
    pub fn route(&self, id: RouteId) -> Option<&Arc<CompiledRoute>> {
        self.routes.get(id.0)
    }

    /// Returns every compiled route in registration order.
    pub fn routes(&self) -> &[Arc<CompiledRoute>] {
        &self.routes
    }

    /// Returns the number of routers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no routers.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the router's own services followed by its parent's effective
    /// services, up to the root.
    pub fn effective_services(&self, id: RouterId) -> Vec<Arc<Service>> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut services = node.services.clone();
        if let Some(parent) = node.parent {
            services.extend(self.effective_services(parent));
        }
        services
    }

    /// Returns the router's own error handlers followed by its parent's
    /// effective error handlers, up to the root.
    pub fn effective_error_handlers(&self, id: RouterId) -> Vec<Arc<ErrorHandler>> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut handlers = node.error_handlers.clone();
        if let Some(parent) = node.parent {
            handlers.extend(self.effective_error_handlers(parent));
        }
        handlers
    }
}
