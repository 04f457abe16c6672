use super::layout::RelationshipTypeOptions;
use super::{ModelEvent, RelationshipOutcome, RequestTarget};
use crate::config::ModelConfig;
use crate::fetch::{DataFetcher, FetchHold};
use crate::graph::{
    AttributeType, AttributeTypeId, EventEmitter, Graph, Iri, ModelError, ModelResult, Node, NodeData,
    NodeId, Point, Relationship, RelationshipData, RelationshipId, RelationshipType,
    RelationshipTypeId, SubscriptionId, TypeHierarchyNode, TypeNodeId,
};
use crate::history::{commands, Command, History, NoopHistory, UndoStack};
use crate::provider::{
    DataProvider, FilterCriteria, ProviderError, RelatedNodesQuery, RelationshipQuery,
    RelationshipTypeCount, TypeHierarchyEntry,
};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub(super) struct ModelInner {
    pub(super) graph: Mutex<Graph>,
    pub(super) history: Mutex<Box<dyn History>>,
    pub(super) provider: Arc<dyn DataProvider>,
    fetcher: DataFetcher,
    pub(super) config: ModelConfig,
    /// Visibility overrides for types not yet present in the graph
    pub(super) type_options: DashMap<RelationshipTypeId, RelationshipTypeOptions>,
    generations: DashMap<RequestTarget, u64>,
    next_generation: AtomicU64,
    events: Arc<RwLock<EventEmitter<ModelEvent>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// The semantic diagram model
///
/// A cheap-to-clone handle; clones share the same graph, history and
/// provider. Locks are never held across an await, and the history lock
/// is always taken before the graph lock.
///
/// Listeners run synchronously while the graph is locked, so they must
/// not call back into the model. Operations that hydrate entities in the
/// background need a Tokio runtime; without one the request is skipped.
#[derive(Clone)]
pub struct DiagramModel {
    pub(super) inner: Arc<ModelInner>,
}

impl std::fmt::Debug for DiagramModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.inner.graph.lock().unwrap();
        f.debug_struct("DiagramModel")
            .field("nodes", &graph.node_count())
            .field("relationships", &graph.relationship_count())
            .finish()
    }
}

impl DiagramModel {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self::with_config(provider, ModelConfig::default())
    }

    pub fn with_config(provider: Arc<dyn DataProvider>, config: ModelConfig) -> Self {
        let history: Box<dyn History> = if config.undo_enabled {
            Box::new(UndoStack::new().with_max_depth(config.max_undo_depth))
        } else {
            Box::new(NoopHistory::new())
        };
        Self::with_history(provider, config, history)
    }

    /// Build a model around a caller-supplied history
    pub fn with_history(
        provider: Arc<dyn DataProvider>,
        config: ModelConfig,
        history: Box<dyn History>,
    ) -> Self {
        let events = Arc::new(RwLock::new(EventEmitter::new()));
        let mut graph = Graph::new();
        let forward = events.clone();
        graph.subscribe(move |event| {
            forward
                .read()
                .unwrap()
                .emit(&ModelEvent::Graph(event.clone()));
        });

        Self {
            inner: Arc::new(ModelInner {
                graph: Mutex::new(graph),
                history: Mutex::new(history),
                fetcher: DataFetcher::new(provider.clone()),
                provider,
                config,
                type_options: DashMap::new(),
                generations: DashMap::new(),
                next_generation: AtomicU64::new(0),
                events,
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.inner.config
    }

    // --- Events ---

    pub fn subscribe(&self, listener: impl Fn(&ModelEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.inner.events.write().unwrap().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.write().unwrap().unsubscribe(id)
    }

    pub(super) fn emit(&self, event: ModelEvent) {
        self.inner.events.read().unwrap().emit(&event);
    }

    // --- Graph access ---

    /// Run a read-only closure against the graph
    pub fn with_graph<R>(&self, read: impl FnOnce(&Graph) -> R) -> R {
        read(&self.inner.graph.lock().unwrap())
    }

    /// Run a closure against the graph outside the command history
    pub fn with_graph_mut<R>(&self, write: impl FnOnce(&mut Graph) -> R) -> R {
        write(&mut self.inner.graph.lock().unwrap())
    }

    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.with_graph(|g| g.node(id).cloned())
    }

    pub fn relationship(&self, id: &RelationshipId) -> Option<Relationship> {
        self.with_graph(|g| g.relationship(id).cloned())
    }

    pub fn relationship_type(&self, id: &RelationshipTypeId) -> Option<RelationshipType> {
        self.with_graph(|g| g.relationship_type(id).cloned())
    }

    pub fn type_hierarchy_node(&self, id: &TypeNodeId) -> Option<TypeHierarchyNode> {
        self.with_graph(|g| g.type_hierarchy_node(id).cloned())
    }

    pub fn attribute_type(&self, id: &AttributeTypeId) -> Option<AttributeType> {
        self.with_graph(|g| g.attribute_type(id).cloned())
    }

    // --- Command history ---

    pub fn execute(&self, command: Command) -> ModelResult<()> {
        let mut history = self.inner.history.lock().unwrap();
        let mut graph = self.inner.graph.lock().unwrap();
        history.execute(&mut graph, command)
    }

    /// Record an inverse for a change the caller already made
    pub fn register_to_undo(&self, inverse: Command) {
        self.inner.history.lock().unwrap().register_to_undo(inverse);
    }

    pub fn undo(&self) -> ModelResult<()> {
        let mut history = self.inner.history.lock().unwrap();
        let mut graph = self.inner.graph.lock().unwrap();
        history.undo(&mut graph)
    }

    pub fn redo(&self) -> ModelResult<()> {
        let mut history = self.inner.history.lock().unwrap();
        let mut graph = self.inner.graph.lock().unwrap();
        history.redo(&mut graph)
    }

    pub fn start_batch(&self, description: &str) {
        self.inner.history.lock().unwrap().start_batch(description);
    }

    pub fn store_batch(&self) -> ModelResult<()> {
        self.inner.history.lock().unwrap().store_batch()
    }

    pub fn discard_batch(&self) -> ModelResult<()> {
        let mut history = self.inner.history.lock().unwrap();
        let mut graph = self.inner.graph.lock().unwrap();
        history.discard_batch(&mut graph)
    }

    pub fn can_undo(&self) -> bool {
        self.inner.history.lock().unwrap().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.history.lock().unwrap().can_redo()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.inner.history.lock().unwrap().undo_description().map(String::from)
    }

    pub fn redo_description(&self) -> Option<String> {
        self.inner.history.lock().unwrap().redo_description().map(String::from)
    }

    /// Command that asks the provider for fresh data of `identities`
    ///
    /// Useful as an effect inside a batch: undoing or redoing it requests
    /// the data again instead of restoring a stale payload.
    pub fn reload_node_data_command(&self, identities: Vec<Iri>) -> Command {
        let model = self.clone();
        Command::effect("Reload node data", move |_graph| {
            let identities = identities.clone();
            model.background(|| {
                let request = model.fetch_node_data(identities);
                let reporter = model.clone();
                async move {
                    if let Err(err) = request.await {
                        reporter.report_failure(err);
                    }
                }
            });
        })
    }

    // --- Nodes ---

    /// Place a node for `identity` and hydrate it in the background
    ///
    /// The node starts as a placeholder with the configured default size.
    pub fn create_node(&self, identity: impl Into<Iri>, position: Point) -> ModelResult<NodeId> {
        let identity = identity.into();
        let node = Node::placeholder(NodeId::new(), identity.clone())
            .with_position(position)
            .with_size(self.inner.config.default_node_size);
        let id = node.id().clone();
        self.execute(commands::add_node(node))?;
        self.spawn_node_request(vec![identity]);
        Ok(id)
    }

    /// Place a node whose payload is already known
    pub fn create_node_with_data(&self, data: NodeData, position: Point) -> ModelResult<NodeId> {
        let node = Node::new(NodeId::new(), data.clone())
            .with_position(position)
            .with_size(self.inner.config.default_node_size);
        let id = node.id().clone();
        self.execute(commands::add_node(node))?;
        self.register_node_types(&data)?;
        Ok(id)
    }

    pub fn remove_node(&self, id: &NodeId) -> ModelResult<()> {
        self.execute(commands::remove_node(id.clone()))
    }

    pub fn move_node(&self, id: &NodeId, position: Point) -> ModelResult<()> {
        self.execute(commands::set_node_position(id.clone(), position))
    }

    /// Delay coalesced fetches until the returned hold is dropped
    ///
    /// On a multi-threaded runtime, hold while creating a burst of nodes
    /// so their hydration shares one provider call per request kind. Never
    /// await a request while holding: its flush waits for the hold.
    pub fn hold_requests(&self) -> FetchHold {
        self.inner.fetcher.hold()
    }

    /// Request payloads for `identities` through the node coalescer
    ///
    /// Every node showing a fetched identity receives the payload with a
    /// single data change event. A provider failure leaves the nodes as
    /// they were and fires `LoadingFailed`.
    pub fn request_node_data(
        &self,
        identities: Vec<Iri>,
    ) -> impl Future<Output = ModelResult<()>> + Send + 'static {
        let request = self.fetch_node_data(identities);
        let model = self.clone();
        async move {
            let result = request.await;
            if let Err(err) = &result {
                model.report_failure(err.clone());
            }
            result
        }
    }

    pub(super) fn spawn_node_request(&self, identities: Vec<Iri>) {
        self.background(|| {
            let request = self.request_node_data(identities);
            async move {
                let _ = request.await;
            }
        });
    }

    /// Fetch and apply node payloads without reporting failures
    pub(super) fn fetch_node_data(
        &self,
        identities: Vec<Iri>,
    ) -> impl Future<Output = ModelResult<()>> + Send + 'static {
        let _hold = self.inner.fetcher.nodes.hold();
        let mut seen = HashSet::new();
        let requests: Vec<_> = identities
            .into_iter()
            .filter(|iri| seen.insert(iri.clone()))
            .map(|iri| {
                let generation = self.begin_request(RequestTarget::NodeData(iri.clone()));
                let pending = self.inner.fetcher.nodes.push(iri.clone());
                (iri, generation, pending)
            })
            .collect();

        let model = self.clone();
        async move {
            let mut failure: Option<ProviderError> = None;
            for (iri, generation, pending) in requests {
                match pending.await {
                    Ok(Some(data)) => {
                        if model.is_current(&RequestTarget::NodeData(iri.clone()), generation) {
                            model.apply_node_data(data)?;
                        } else {
                            debug!(identity = %iri, "dropping superseded node data");
                        }
                    }
                    Ok(None) => debug!(identity = %iri, "provider has no data for node"),
                    Err(err) => {
                        failure.get_or_insert(err);
                    }
                }
            }
            match failure {
                Some(err) => Err(ModelError::from(err)),
                None => Ok(()),
            }
        }
    }

    fn apply_node_data(&self, data: NodeData) -> ModelResult<()> {
        {
            let mut graph = self.inner.graph.lock().unwrap();
            let ids: Vec<NodeId> = graph
                .nodes_by_identity(&data.id)
                .map(|n| n.id().clone())
                .collect();
            for id in ids {
                let payload = data.clone();
                graph.update_node(&id, move |node| node.set_data(payload))?;
            }
        }
        self.register_node_types(&data)
    }

    /// Make sure the types and attributes a payload refers to exist
    fn register_node_types(&self, data: &NodeData) -> ModelResult<()> {
        for type_id in &data.types {
            self.create_type_hierarchy_node(type_id)?;
        }
        for attribute in data.attributes.keys() {
            self.create_attribute_type(attribute)?;
        }
        Ok(())
    }

    // --- Relationships ---

    /// Add a relationship between two placed nodes, recorded for undo
    ///
    /// The relationship type is created on first use. Creation is
    /// suppressed when an endpoint is missing or the type is hidden; an
    /// equivalent relationship that already exists is reused.
    pub fn create_relationship(
        &self,
        source: &NodeId,
        target: &NodeId,
        data: RelationshipData,
    ) -> ModelResult<RelationshipOutcome> {
        self.create_relationship_type(&data.type_id)?;
        let candidate = Relationship::new(RelationshipId::new(), source.clone(), target.clone(), data);
        let mut history = self.inner.history.lock().unwrap();
        let mut graph = self.inner.graph.lock().unwrap();
        place_relationship(&mut graph, Some(&mut **history), candidate)
    }

    pub fn remove_relationship(&self, id: &RelationshipId) -> ModelResult<()> {
        self.execute(commands::remove_relationship(id.clone()))
    }

    /// Fetch the relationships among placed nodes
    ///
    /// With `None` every node on the diagram takes part. Relationships the
    /// provider confirms lose their layout-only flag; new ones are added
    /// outside the command history. Resolves to the number of new
    /// relationships.
    pub fn request_relationships(
        &self,
        node_ids: Option<Vec<NodeId>>,
    ) -> impl Future<Output = ModelResult<usize>> + Send + 'static {
        let identities = self.identities_of(node_ids);
        let query = RelationshipQuery {
            node_ids: identities,
            type_ids: Vec::new(),
        };
        self.fetch_relationships(RequestTarget::Relationships, query)
    }

    fn fetch_relationships(
        &self,
        target: RequestTarget,
        query: RelationshipQuery,
    ) -> impl Future<Output = ModelResult<usize>> + Send + 'static {
        let generation = self.begin_request(target.clone());
        let model = self.clone();
        async move {
            if query.node_ids.is_empty() {
                return Ok(0);
            }
            let found = model.inner.provider.relationships_info(&query).await?;
            if !model.is_current(&target, generation) {
                debug!(?target, "dropping superseded relationships");
                return Ok(0);
            }
            model.add_fetched_relationships(found)
        }
    }

    fn identities_of(&self, node_ids: Option<Vec<NodeId>>) -> Vec<Iri> {
        let graph = self.inner.graph.lock().unwrap();
        let mut seen = HashSet::new();
        let identities: Vec<Iri> = match node_ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| graph.node(id))
                .map(|n| n.identity().clone())
                .collect(),
            None => graph.nodes().map(|n| n.identity().clone()).collect(),
        };
        identities.into_iter().filter(|iri| seen.insert(iri.clone())).collect()
    }

    /// Place provider relationships between every pair of nodes showing
    /// their endpoints
    fn add_fetched_relationships(&self, found: Vec<RelationshipData>) -> ModelResult<usize> {
        for data in &found {
            self.create_relationship_type(&data.type_id)?;
        }

        let mut graph = self.inner.graph.lock().unwrap();
        let mut created = 0;
        for data in found {
            let sources: Vec<NodeId> = graph
                .nodes_by_identity(&data.source)
                .map(|n| n.id().clone())
                .collect();
            let targets: Vec<NodeId> = graph
                .nodes_by_identity(&data.target)
                .map(|n| n.id().clone())
                .collect();
            for source in &sources {
                for target in &targets {
                    let candidate = Relationship::new(
                        RelationshipId::new(),
                        source.clone(),
                        target.clone(),
                        data.clone(),
                    );
                    if let RelationshipOutcome::Created(_) = place_relationship(&mut graph, None, candidate)? {
                        created += 1;
                    }
                }
            }
        }
        debug!(created, "placed fetched relationships");
        Ok(created)
    }

    // --- Relationship types ---

    /// Ensure a relationship type exists, creating and hydrating it lazily
    ///
    /// A pending visibility override for the type is applied on creation.
    pub fn create_relationship_type(&self, id: &RelationshipTypeId) -> ModelResult<()> {
        if self.ensure_relationship_type(id)? {
            self.background(|| {
                let pending = self.inner.fetcher.relationship_types.push(id.clone());
                let model = self.clone();
                let id = id.clone();
                async move {
                    match pending.await {
                        Ok(Some(info)) => {
                            let applied = model.with_graph_mut(|g| {
                                g.update_relationship_type(&id, |t| t.set_label(info.label))
                            });
                            if let Err(err) = applied {
                                warn!(type_id = %id, error = %err, "could not label relationship type");
                            }
                        }
                        Ok(None) => debug!(type_id = %id, "provider has no relationship type info"),
                        Err(err) => warn!(type_id = %id, error = %err, "relationship type hydration failed"),
                    }
                }
            });
        }
        Ok(())
    }

    /// Returns true when the type was created by this call
    fn ensure_relationship_type(&self, id: &RelationshipTypeId) -> ModelResult<bool> {
        let mut graph = self.inner.graph.lock().unwrap();
        if graph.relationship_type(id).is_some() {
            return Ok(false);
        }
        let mut relationship_type = RelationshipType::new(id.clone());
        if let Some((_, options)) = self.inner.type_options.remove(id) {
            relationship_type = relationship_type.with_visibility(options.visible, options.show_label);
        }
        graph.add_relationship_type(relationship_type)?;
        Ok(true)
    }

    /// Show or hide a relationship type
    ///
    /// Hiding removes every relationship of the type and abandons any
    /// fetch in flight for it. Showing a hidden type fetches its
    /// relationships again unless `prevent_loading` is set. The change is
    /// recorded for undo; undoing a hide puts the removed relationships
    /// back without fetching.
    pub fn set_relationship_type_visibility(
        &self,
        id: &RelationshipTypeId,
        visible: bool,
        show_label: bool,
        prevent_loading: bool,
    ) -> ModelResult<()> {
        self.create_relationship_type(id)?;
        let was_visible = {
            let mut history = self.inner.history.lock().unwrap();
            let mut graph = self.inner.graph.lock().unwrap();
            let previous = graph
                .relationship_type(id)
                .map_or((true, true), |t| (t.visible(), t.show_label()));
            if previous != (visible, show_label) {
                history.execute(
                    &mut graph,
                    commands::set_relationship_type_visibility(id.clone(), visible, show_label),
                )?;
            }
            previous.0
        };

        let target = RequestTarget::RelationshipsOfType(id.clone());
        if !visible {
            self.begin_request(target);
        } else if !was_visible && !prevent_loading {
            self.background(|| {
                let query = RelationshipQuery {
                    node_ids: self.identities_of(None),
                    type_ids: vec![id.clone()],
                };
                let request = self.fetch_relationships(target, query);
                let model = self.clone();
                async move {
                    if let Err(err) = request.await {
                        model.report_failure(err);
                    }
                }
            });
        }
        Ok(())
    }

    /// Record visibility overrides for types that may not exist yet
    ///
    /// Overrides for types already in the graph are applied right away
    /// without loading anything.
    pub fn apply_relationship_type_options(&self, options: Vec<RelationshipTypeOptions>) -> ModelResult<()> {
        let mut graph = self.inner.graph.lock().unwrap();
        for option in options {
            if graph.relationship_type(&option.type_id).is_some() {
                graph.update_relationship_type(&option.type_id, |t| {
                    t.set_visibility(option.visible, option.show_label)
                })?;
            } else {
                self.inner.type_options.insert(option.type_id.clone(), option);
            }
        }
        Ok(())
    }

    /// Hide visible relationship types that have no relationships
    pub fn hide_unused_relationship_types(&self) -> ModelResult<usize> {
        let mut graph = self.inner.graph.lock().unwrap();
        let unused: Vec<(RelationshipTypeId, bool)> = graph
            .relationship_types()
            .filter(|t| t.visible())
            .map(|t| (t.id().clone(), t.show_label()))
            .filter(|(id, _)| graph.relationships_of_type(id).next().is_none())
            .collect();
        for (id, show_label) in &unused {
            graph.update_relationship_type(id, |t| t.set_visibility(false, *show_label))?;
        }
        Ok(unused.len())
    }

    pub async fn load_relationship_types(&self) -> ModelResult<()> {
        let types = self.inner.provider.relationship_types().await?;
        for info in types {
            self.ensure_relationship_type(&info.id)?;
            self.with_graph_mut(|g| g.update_relationship_type(&info.id, |t| t.set_label(info.label)))?;
        }
        Ok(())
    }

    // --- Type hierarchy and attributes ---

    /// Ensure a type hierarchy node exists
    pub fn create_type_hierarchy_node(&self, id: &TypeNodeId) -> ModelResult<()> {
        let mut graph = self.inner.graph.lock().unwrap();
        if graph.type_hierarchy_node(id).is_none() {
            graph.add_type_hierarchy_node(TypeHierarchyNode::new(id.clone()))?;
        }
        Ok(())
    }

    /// Fetch the whole type hierarchy and mirror it into the graph
    pub async fn load_type_hierarchy(&self) -> ModelResult<()> {
        let roots = self.inner.provider.type_hierarchy().await?;
        self.apply_type_hierarchy(roots)
    }

    fn apply_type_hierarchy(&self, roots: Vec<TypeHierarchyEntry>) -> ModelResult<()> {
        let mut graph = self.inner.graph.lock().unwrap();
        let mut stack: Vec<(Option<TypeNodeId>, TypeHierarchyEntry)> =
            roots.into_iter().rev().map(|entry| (None, entry)).collect();
        while let Some((base, entry)) = stack.pop() {
            if graph.type_hierarchy_node(&entry.id).is_none() {
                graph.add_type_hierarchy_node(TypeHierarchyNode::new(entry.id.clone()))?;
            }
            graph.update_type_hierarchy_node(&entry.id, |n| n.set_label(entry.label))?;
            graph.update_type_hierarchy_node(&entry.id, |n| n.set_count(entry.count))?;
            graph.set_type_base(&entry.id, base)?;
            for child in entry.children.into_iter().rev() {
                stack.push((Some(entry.id.clone()), child));
            }
        }
        Ok(())
    }

    /// Ensure an attribute type exists, hydrating its label lazily
    pub fn create_attribute_type(&self, id: &AttributeTypeId) -> ModelResult<()> {
        let created = {
            let mut graph = self.inner.graph.lock().unwrap();
            match graph.attribute_type(id) {
                Some(_) => false,
                None => {
                    graph.add_attribute_type(AttributeType::new(id.clone()))?;
                    true
                }
            }
        };
        if created {
            self.background(|| {
                let pending = self.inner.fetcher.attribute_types.push(id.clone());
                let model = self.clone();
                let id = id.clone();
                async move {
                    match pending.await {
                        Ok(Some(info)) => {
                            let applied = model
                                .with_graph_mut(|g| g.update_attribute_type(&id, |t| t.set_label(info.label)));
                            if let Err(err) = applied {
                                warn!(attribute = %id, error = %err, "could not label attribute type");
                            }
                        }
                        Ok(None) => debug!(attribute = %id, "provider has no attribute info"),
                        Err(err) => warn!(attribute = %id, error = %err, "attribute hydration failed"),
                    }
                }
            });
        }
        Ok(())
    }

    // --- Provider passthroughs ---

    pub async fn relationship_types_of(&self, identity: &Iri) -> ModelResult<Vec<RelationshipTypeCount>> {
        Ok(self.inner.provider.relationship_types_of(identity).await?)
    }

    pub async fn filter(&self, criteria: &FilterCriteria) -> ModelResult<HashMap<Iri, NodeData>> {
        Ok(self.inner.provider.filter(criteria).await?)
    }

    pub async fn related_nodes(&self, query: &RelatedNodesQuery) -> ModelResult<HashMap<Iri, NodeData>> {
        Ok(self.inner.provider.related_nodes(query).await?)
    }

    // --- Background work ---

    /// Wait until every background request, including ones they start,
    /// has finished
    pub async fn wait_for_loading(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.tasks.lock().unwrap());
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    warn!(error = %err, "background request panicked or was cancelled");
                }
            }
        }
    }

    /// Spawn a tracked task built by `make`
    fn background<F>(&self, make: impl FnOnce() -> F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let handle = runtime.spawn(make());
                let mut tasks = self.inner.tasks.lock().unwrap();
                tasks.retain(|task| !task.is_finished());
                tasks.push(handle);
            }
            Err(_) => warn!("no async runtime, background request skipped"),
        }
    }

    pub(super) fn report_failure(&self, err: ModelError) {
        warn!(error = %err, "loading failed");
        self.emit(ModelEvent::LoadingFailed(err));
    }

    /// Start a new generation for `target`, superseding earlier requests
    pub(super) fn begin_request(&self, target: RequestTarget) -> u64 {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.generations.insert(target, generation);
        generation
    }

    pub(super) fn is_current(&self, target: &RequestTarget, generation: u64) -> bool {
        self.inner
            .generations
            .get(target)
            .map_or(false, |current| *current == generation)
    }

    /// Abandon every request in flight
    pub(super) fn supersede_requests(&self) {
        self.inner.generations.clear();
    }
}

/// Add `candidate` unless it is suppressed or already present
///
/// With a history the addition is recorded for undo.
pub(super) fn place_relationship(
    graph: &mut Graph,
    history: Option<&mut dyn History>,
    candidate: Relationship,
) -> ModelResult<RelationshipOutcome> {
    let endpoints = (
        graph.node(candidate.source_id()).map(|n| n.identity().clone()),
        graph.node(candidate.target_id()).map(|n| n.identity().clone()),
    );
    let (Some(source), Some(target)) = endpoints else {
        debug!(relationship = %candidate.id(), "suppressed: endpoint not on the diagram");
        return Ok(RelationshipOutcome::Suppressed);
    };
    if source != candidate.data().source || target != candidate.data().target {
        return Err(ModelError::IdentityMismatch {
            id: candidate.id().clone(),
            expected: format!("{} -> {}", source, target),
            found: format!("{} -> {}", candidate.data().source, candidate.data().target),
        });
    }

    let visible = graph
        .relationship_type(candidate.type_id())
        .map(|t| t.visible())
        .ok_or_else(|| ModelError::UnknownType(candidate.type_id().clone()))?;
    if !visible {
        debug!(type_id = %candidate.type_id(), "suppressed: relationship type is hidden");
        return Ok(RelationshipOutcome::Suppressed);
    }

    let existing = graph
        .find_relationship(candidate.type_id(), candidate.source_id(), candidate.target_id())
        .map(|r| r.id().clone());
    if let Some(id) = existing {
        if !candidate.layout_only() {
            let data = candidate.data().clone();
            graph.update_relationship(&id, |r| r.set_data(data))?;
            graph.update_relationship(&id, |r| Ok(r.set_layout_only(false)))?;
        }
        return Ok(RelationshipOutcome::Reused(id));
    }

    let id = candidate.id().clone();
    match history {
        Some(history) => history.execute(graph, commands::add_relationship(candidate))?,
        None => graph.add_relationship(candidate)?,
    }
    Ok(RelationshipOutcome::Created(id))
}
