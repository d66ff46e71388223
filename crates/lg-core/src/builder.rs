//! Graph construction from lowered SQL statements
//!
//! Files are parsed once into [`FileUnit`]s and cached by checksum. Every
//! build assembles the whole graph from the cached units, so a re-processed
//! or removed file can never leave stale nodes or edges behind.

use crate::checksum::compute_checksum;
use crate::config::Config;
use crate::graph::LineageGraph;
use crate::model::{
    cte_node_id, edge_id, node_id, ColumnEdge, Diagnostic, EdgeMetadata, EdgeType, LineageEdge, LineageNode,
    NodeMetadata, NodeType, StatementRecord, Transformation,
};
use lg_sql::{
    extract_dependencies, last_segment, lower_statement, ColumnRef, ExprKind, JoinKind,
    ProjectionItem, QueryShape, RelationShape, RelationSource, SelectShape, SqlDialect, SqlError,
    SqlParser, SqlStatement, StatementKind,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Upper bound on column-propagation passes (wildcards through view chains)
const MAX_COLUMN_PASSES: usize = 8;

/// One indexed SQL file
#[derive(Debug, Clone, PartialEq)]
pub struct FileUnit {
    /// Workspace-relative path
    pub path: String,
    /// SHA-256 of the source text
    pub checksum: String,
    pub statements: Vec<SqlStatement>,
    /// Every relation name the file mentions
    pub dependencies: BTreeSet<String>,
    /// Set when the file failed to parse
    pub diagnostic: Option<Diagnostic>,
}

impl FileUnit {
    /// Parse and lower a file. Parse failures become a diagnostic and the
    /// file contributes no statements.
    pub fn parse(path: &str, sql: &str, parser: &SqlParser) -> Self {
        let checksum = compute_checksum(sql);
        match parser.parse(sql) {
            Ok(ast) => Self {
                path: path.to_string(),
                checksum,
                statements: ast.iter().map(lower_statement).collect(),
                dependencies: extract_dependencies(&ast),
                diagnostic: None,
            },
            Err(SqlError::EmptySql) => Self {
                path: path.to_string(),
                checksum,
                statements: Vec::new(),
                dependencies: BTreeSet::new(),
                diagnostic: None,
            },
            Err(e) => {
                log::warn!("Skipping {}: {}", path, e);
                let (line, column) = e.location().unzip();
                Self {
                    path: path.to_string(),
                    checksum,
                    statements: Vec::new(),
                    dependencies: BTreeSet::new(),
                    diagnostic: Some(Diagnostic {
                        file_path: path.to_string(),
                        message: e.to_string(),
                        line,
                        column,
                    }),
                }
            }
        }
    }

    /// Wrap statements lowered elsewhere
    pub fn from_statements(path: &str, statements: Vec<SqlStatement>) -> Self {
        let fingerprint = format!("{:?}", statements);
        let dependencies = statements
            .iter()
            .filter_map(|s| s.target().map(str::to_string))
            .collect();
        Self {
            path: path.to_string(),
            checksum: compute_checksum(&fingerprint),
            statements,
            dependencies,
            diagnostic: None,
        }
    }
}

/// Incremental graph builder holding the parsed state of every file
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    parser: SqlParser,
    external_tables: Vec<String>,
    files: BTreeMap<String, Arc<FileUnit>>,
}

impl GraphBuilder {
    /// Create a builder parsing with `dialect`
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            parser: SqlParser::new(dialect),
            external_tables: Vec::new(),
            files: BTreeMap::new(),
        }
    }

    /// Create a builder from workspace configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.dialect).with_external_tables(config.external_tables.iter().cloned())
    }

    /// Declare relations defined outside the indexed SQL
    pub fn with_external_tables(mut self, tables: impl IntoIterator<Item = String>) -> Self {
        self.external_tables = tables.into_iter().map(|t| t.to_lowercase()).collect();
        self
    }

    /// Add or replace a file from source text.
    ///
    /// Returns `false` when the file is unchanged (same checksum) and was
    /// not re-parsed.
    pub fn set_file(&mut self, path: &str, sql: &str) -> bool {
        let checksum = compute_checksum(sql);
        if let Some(existing) = self.files.get(path) {
            if existing.checksum == checksum {
                log::debug!("{} unchanged, keeping cached statements", path);
                return false;
            }
        }
        let unit = FileUnit::parse(path, sql, &self.parser);
        self.files.insert(path.to_string(), Arc::new(unit));
        true
    }

    /// Add or replace a file from already lowered statements
    pub fn set_statements(&mut self, path: &str, statements: Vec<SqlStatement>) {
        let unit = FileUnit::from_statements(path, statements);
        self.files.insert(path.to_string(), Arc::new(unit));
    }

    /// Drop a file and everything attributed to it
    pub fn remove_file(&mut self, path: &str) -> bool {
        self.files.remove(path).is_some()
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Indexed file units, ordered by path
    pub fn files(&self) -> impl Iterator<Item = &FileUnit> {
        self.files.values().map(|f| f.as_ref())
    }

    /// Cheap copy of the current state for building off-thread
    pub fn input(&self) -> BuildInput {
        BuildInput {
            files: self.files.clone(),
            external_tables: self.external_tables.clone(),
        }
    }

    /// Build the next graph snapshot
    pub fn build(&self) -> LineageGraph {
        self.input().build()
    }
}

/// Immutable build input (shared file units)
#[derive(Debug, Clone, Default)]
pub struct BuildInput {
    files: BTreeMap<String, Arc<FileUnit>>,
    external_tables: Vec<String>,
}

impl BuildInput {
    /// Build a graph
    pub fn build(&self) -> LineageGraph {
        self.build_cancellable(|| false)
            .unwrap_or_else(LineageGraph::empty)
    }

    /// Build a graph, giving up (returning `None`) once `is_cancelled`
    /// reports true between propagation passes.
    pub fn build_cancellable(&self, is_cancelled: impl Fn() -> bool) -> Option<LineageGraph> {
        let registry = Registry::collect(&self.files, &self.external_tables);

        let mut known = registry.explicit_columns();
        let mut pass = Pass::run(&registry, &self.files, &known);
        for iteration in 1..MAX_COLUMN_PASSES {
            if is_cancelled() {
                log::debug!("Build cancelled after {} pass(es)", iteration);
                return None;
            }
            let next = pass.known_columns(&registry);
            if next == known {
                break;
            }
            known = next;
            pass = Pass::run(&registry, &self.files, &known);
        }
        if is_cancelled() {
            return None;
        }

        let final_columns = pass.known_columns(&registry);
        let mut nodes = registry.nodes(&final_columns);
        nodes.extend(pass.cte_nodes(&final_columns));
        nodes.extend(pass.external_nodes());

        let diagnostics = self
            .files
            .values()
            .filter_map(|f| f.diagnostic.clone())
            .collect();

        Some(LineageGraph::from_parts(
            nodes,
            pass.edges,
            pass.column_edges,
            pass.statements,
            diagnostics,
        ))
    }
}

/// How firmly a name is defined; stronger definitions win on conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Strength {
    /// INSERT/UPDATE/DELETE/MERGE target
    Written,
    /// Listed in `external_tables`
    Declared,
    /// CREATE VIEW / CREATE TABLE
    Created,
}

#[derive(Debug, Clone)]
struct Definition {
    node_type: NodeType,
    name: String,
    strength: Strength,
    files: Vec<String>,
    explicit_columns: Vec<String>,
    materialized: bool,
}

impl Definition {
    fn id(&self) -> String {
        node_id(self.node_type, &self.name)
    }
}

/// Every relation defined anywhere in the workspace, keyed by name
#[derive(Debug, Default)]
struct Registry {
    defs: BTreeMap<String, Definition>,
    by_last: HashMap<String, Vec<String>>,
}

impl Registry {
    fn collect(files: &BTreeMap<String, Arc<FileUnit>>, external_tables: &[String]) -> Self {
        let mut registry = Registry::default();

        for name in external_tables {
            registry.define(name, NodeType::External, Strength::Declared, None, &[], false);
        }

        for unit in files.values() {
            let file = Some(unit.path.as_str());
            for stmt in &unit.statements {
                match stmt {
                    SqlStatement::CreateView(view) => registry.define(
                        &view.name,
                        NodeType::View,
                        Strength::Created,
                        file,
                        &view.columns,
                        view.materialized,
                    ),
                    SqlStatement::CreateTable(table) => registry.define(
                        &table.name,
                        NodeType::Table,
                        Strength::Created,
                        file,
                        &table.columns,
                        false,
                    ),
                    SqlStatement::Insert(_)
                    | SqlStatement::Update(_)
                    | SqlStatement::Delete(_)
                    | SqlStatement::Merge(_) => {
                        if let Some(target) = stmt.target() {
                            registry.define(
                                target,
                                NodeType::Table,
                                Strength::Written,
                                file,
                                &[],
                                false,
                            );
                        }
                    }
                    SqlStatement::Select(_) | SqlStatement::Unsupported { .. } => {}
                }
            }
        }

        for name in registry.defs.keys() {
            registry
                .by_last
                .entry(last_segment(name).to_string())
                .or_default()
                .push(name.clone());
        }
        registry
    }

    fn define(
        &mut self,
        name: &str,
        node_type: NodeType,
        strength: Strength,
        file: Option<&str>,
        columns: &[String],
        materialized: bool,
    ) {
        let name = name.to_lowercase();
        let def = self.defs.entry(name.clone()).or_insert_with(|| Definition {
            node_type,
            name,
            strength,
            files: Vec::new(),
            explicit_columns: Vec::new(),
            materialized: false,
        });

        let mut primary = false;
        if strength > def.strength {
            primary = true;
            def.node_type = node_type;
            def.strength = strength;
            def.materialized = materialized;
            if !columns.is_empty() {
                def.explicit_columns = columns.to_vec();
            }
        } else if strength == def.strength && def.node_type != node_type {
            log::debug!(
                "{} defined as both {} and {}; keeping {}",
                def.name,
                def.node_type,
                node_type,
                def.node_type
            );
        } else if strength == def.strength {
            def.materialized |= materialized;
        }
        if def.explicit_columns.is_empty() && !columns.is_empty() {
            def.explicit_columns = columns.to_vec();
        }
        // The defining file leads; writers follow in path order
        if let Some(file) = file {
            if primary {
                def.files.retain(|f| f != file);
                def.files.insert(0, file.to_string());
            } else if !def.files.iter().any(|f| f == file) {
                def.files.push(file.to_string());
            }
        }
    }

    /// Resolve a relation name: exact match, then a unique dotted-suffix
    /// match. An unqualified reference matches any definition with that
    /// last segment; a qualified one matches definitions it ends with or
    /// that end with it (`public.orders` finds `orders`).
    fn lookup(&self, name: &str) -> Option<&Definition> {
        if let Some(def) = self.defs.get(name) {
            return Some(def);
        }
        let candidates: Vec<&String> = self
            .by_last
            .get(last_segment(name))
            .map(|names| {
                names
                    .iter()
                    .filter(|def| !name.contains('.') || suffix_match(def, name))
                    .collect()
            })
            .unwrap_or_default();
        match candidates.as_slice() {
            [only] => self.defs.get(*only),
            _ => None,
        }
    }

    fn explicit_columns(&self) -> HashMap<String, Vec<String>> {
        self.defs
            .values()
            .filter(|d| !d.explicit_columns.is_empty())
            .map(|d| (d.id(), d.explicit_columns.clone()))
            .collect()
    }

    fn nodes(&self, columns: &HashMap<String, Vec<String>>) -> Vec<LineageNode> {
        self.defs
            .values()
            .map(|def| {
                let id = def.id();
                LineageNode {
                    metadata: NodeMetadata {
                        file_path: def.files.first().cloned(),
                        defined_in: def.files.clone(),
                        columns: columns.get(&id).cloned().unwrap_or_default(),
                        parent_id: None,
                        materialized: def.materialized,
                        declared_external: def.strength == Strength::Declared,
                    },
                    id,
                    node_type: def.node_type,
                    name: def.name.clone(),
                }
            })
            .collect()
    }
}

fn suffix_match(a: &str, b: &str) -> bool {
    a == b || a.ends_with(&format!(".{b}")) || b.ends_with(&format!(".{a}"))
}

/// CTE names visible at a point of a query, innermost last
#[derive(Debug, Clone, Default)]
struct Scope {
    ctes: Vec<(String, String)>,
}

impl Scope {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.ctes
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, id)| id.as_str())
    }

    fn push(&mut self, name: &str, id: String) {
        self.ctes.push((name.to_string(), id));
    }
}

/// Where one output column's value comes from
#[derive(Debug, Clone, PartialEq)]
struct Origin {
    node_id: String,
    column: String,
    transformation: Transformation,
}

#[derive(Debug, Clone)]
struct OutputColumn {
    name: String,
    origins: Vec<Origin>,
    expression: Option<String>,
}

#[derive(Debug)]
enum BoundSource {
    Node(String),
    Derived(Vec<OutputColumn>),
}

/// A FROM/JOIN relation resolved within one SELECT
#[derive(Debug)]
struct Bound {
    binding: Option<String>,
    name: Option<String>,
    source: BoundSource,
    joined: bool,
}

/// Edges and reads of the statement being processed
struct StatementCtx<'f> {
    file: &'f str,
    index: usize,
    kind: StatementKind,
    edges: Vec<EdgeDraft>,
    reads: Vec<String>,
}

struct EdgeDraft {
    source: String,
    target: String,
    edge_type: EdgeType,
    join_type: Option<JoinKind>,
    join_condition: Option<String>,
}

impl StatementCtx<'_> {
    fn read(&mut self, id: &str) {
        if !self.reads.iter().any(|r| r == id) {
            self.reads.push(id.to_string());
        }
    }

    /// One edge per pair per statement; `direct` wins over `derived`
    fn edge(&mut self, source: &str, target: &str, edge_type: EdgeType, relation: Option<&RelationShape>) {
        let join = relation.and_then(|r| r.join.as_ref());
        if let Some(existing) = self
            .edges
            .iter_mut()
            .find(|e| e.source == source && e.target == target)
        {
            if existing.edge_type == EdgeType::Derived && edge_type == EdgeType::Direct {
                existing.edge_type = EdgeType::Direct;
                existing.join_type = join.map(|j| j.kind);
                existing.join_condition = join.and_then(|j| j.condition.clone());
            }
            return;
        }
        self.edges.push(EdgeDraft {
            source: source.to_string(),
            target: target.to_string(),
            edge_type,
            join_type: join.map(|j| j.kind),
            join_condition: join.and_then(|j| j.condition.clone()),
        });
    }
}

/// One full sweep over every statement
#[derive(Default)]
struct Pass {
    edges: Vec<LineageEdge>,
    column_edges: Vec<ColumnEdge>,
    statements: Vec<StatementRecord>,
    /// Columns produced by each writer, in first-seen order
    produced: HashMap<String, Vec<String>>,
    /// CTE id -> (name, defining file)
    ctes: BTreeMap<String, (String, String)>,
    /// Referenced names that resolved to nothing
    externals: BTreeSet<String>,
}

struct PassRunner<'a> {
    registry: &'a Registry,
    known: &'a HashMap<String, Vec<String>>,
    out: Pass,
}

impl Pass {
    fn run(
        registry: &Registry,
        files: &BTreeMap<String, Arc<FileUnit>>,
        known: &HashMap<String, Vec<String>>,
    ) -> Pass {
        let mut runner = PassRunner {
            registry,
            known,
            out: Pass::default(),
        };
        for unit in files.values() {
            for (index, stmt) in unit.statements.iter().enumerate() {
                runner.statement(&unit.path, index, stmt);
            }
        }
        runner.out
    }

    /// Column knowledge for the next pass: declared columns win, then
    /// columns produced by writers. Anything still holding `*` is unknown.
    fn known_columns(&self, registry: &Registry) -> HashMap<String, Vec<String>> {
        let mut known = registry.explicit_columns();
        for (id, columns) in &self.produced {
            if known.contains_key(id) || columns.is_empty() || columns.iter().any(|c| c == "*") {
                continue;
            }
            known.insert(id.clone(), columns.clone());
        }
        known
    }

    fn cte_nodes(&self, columns: &HashMap<String, Vec<String>>) -> Vec<LineageNode> {
        self.ctes
            .iter()
            .map(|(id, (name, file))| {
                let mut node = LineageNode::new(NodeType::Cte, name);
                node.id = id.clone();
                node.metadata.file_path = Some(file.clone());
                node.metadata.defined_in = vec![file.clone()];
                node.metadata.columns = columns.get(id).cloned().unwrap_or_default();
                node
            })
            .collect()
    }

    fn external_nodes(&self) -> Vec<LineageNode> {
        self.externals
            .iter()
            .map(|name| LineageNode::new(NodeType::External, name))
            .collect()
    }
}

impl PassRunner<'_> {
    fn statement(&mut self, file: &str, index: usize, stmt: &SqlStatement) {
        let mut ctx = StatementCtx {
            file,
            index,
            kind: stmt.kind(),
            edges: Vec::new(),
            reads: Vec::new(),
        };
        let scope = Scope::default();

        let target = match stmt {
            SqlStatement::Select(query) => {
                self.query(query, None, &scope, &mut ctx);
                None
            }
            SqlStatement::CreateView(view) => {
                let id = self.resolve(&view.name, &scope);
                let outputs = self.query(&view.query, Some(&id), &scope, &mut ctx);
                self.write_columns(&id, &view.columns, &outputs, &mut ctx);
                Some(id)
            }
            SqlStatement::CreateTable(table) => {
                let id = self.resolve(&table.name, &scope);
                match &table.query {
                    Some(query) => {
                        let outputs = self.query(query, Some(&id), &scope, &mut ctx);
                        self.write_columns(&id, &table.columns, &outputs, &mut ctx);
                    }
                    None => self.produce(&id, &table.columns),
                }
                Some(id)
            }
            SqlStatement::Insert(insert) => {
                let id = self.resolve(&insert.target, &scope);
                if let Some(query) = &insert.source {
                    let outputs = self.query(query, Some(&id), &scope, &mut ctx);
                    let columns = if insert.columns.is_empty() {
                        self.known_columns(&id)
                            .filter(|cols| cols.len() == outputs.len())
                            .unwrap_or_default()
                    } else {
                        insert.columns.clone()
                    };
                    self.write_columns(&id, &columns, &outputs, &mut ctx);
                }
                Some(id)
            }
            SqlStatement::Update(m) | SqlStatement::Delete(m) | SqlStatement::Merge(m) => {
                let id = self.resolve(&m.target, &scope);
                let edge_type = if matches!(stmt, SqlStatement::Delete(_)) {
                    EdgeType::Derived
                } else {
                    EdgeType::Direct
                };
                for name in &m.reads {
                    let source = self.resolve_source(name, &scope, Some(id.as_str()));
                    ctx.read(&source);
                    ctx.edge(&source, &id, edge_type, None);
                }
                Some(id)
            }
            SqlStatement::Unsupported { .. } => return,
        };

        for draft in ctx.edges {
            self.out.edges.push(LineageEdge {
                id: edge_id(&draft.source, &draft.target, file, index),
                source_id: draft.source,
                target_id: draft.target,
                edge_type: draft.edge_type,
                metadata: EdgeMetadata {
                    file_path: file.to_string(),
                    statement_index: index,
                    statement_kind: ctx.kind,
                    join_type: draft.join_type,
                    join_condition: draft.join_condition,
                },
            });
        }
        self.out.statements.push(StatementRecord {
            file_path: file.to_string(),
            index,
            kind: ctx.kind,
            target,
            reads: ctx.reads,
        });
    }

    /// Resolve a relation name to a node id: CTEs in scope first, then
    /// workspace definitions, else an external node.
    fn resolve(&mut self, name: &str, scope: &Scope) -> String {
        if let Some(id) = scope.lookup(name) {
            return id.to_string();
        }
        match self.registry.lookup(name) {
            Some(def) => def.id(),
            None => {
                self.out.externals.insert(name.to_string());
                node_id(NodeType::External, name)
            }
        }
    }

    /// Resolve a relation read by a statement. A qualified name never
    /// lands on the relation being written through a suffix match, so
    /// `CREATE TABLE orders AS SELECT * FROM raw.orders` reads an external.
    fn resolve_source(&mut self, name: &str, scope: &Scope, target: Option<&str>) -> String {
        let id = self.resolve(name, scope);
        if name.contains('.')
            && target == Some(id.as_str())
            && !self.registry.defs.contains_key(name)
        {
            self.out.externals.insert(name.to_string());
            return node_id(NodeType::External, name);
        }
        id
    }

    fn known_columns(&self, id: &str) -> Option<Vec<String>> {
        self.known
            .get(id)
            .cloned()
            .filter(|cols| !cols.is_empty())
    }

    fn produce(&mut self, id: &str, columns: &[String]) {
        let entry = self.out.produced.entry(id.to_string()).or_default();
        for column in columns {
            if !entry.contains(column) {
                entry.push(column.clone());
            }
        }
    }

    /// Map outputs onto target columns by position and emit column edges.
    /// An empty `explicit` list means the outputs name the columns.
    fn write_columns(
        &mut self,
        target: &str,
        explicit: &[String],
        outputs: &[OutputColumn],
        ctx: &mut StatementCtx<'_>,
    ) {
        let names: Vec<String> = if explicit.is_empty() {
            outputs.iter().map(|o| o.name.clone()).collect()
        } else {
            explicit.to_vec()
        };

        for (name, output) in names.iter().zip(outputs) {
            if output.origins.is_empty() {
                self.out.column_edges.push(ColumnEdge {
                    source_node_id: target.to_string(),
                    source_column: name.clone(),
                    target_node_id: target.to_string(),
                    target_column: name.clone(),
                    transformation: Transformation::Source,
                    expression: output.expression.clone(),
                    file_path: ctx.file.to_string(),
                    statement_index: ctx.index,
                });
                continue;
            }
            for origin in &output.origins {
                self.out.column_edges.push(ColumnEdge {
                    source_node_id: origin.node_id.clone(),
                    source_column: origin.column.clone(),
                    target_node_id: target.to_string(),
                    target_column: name.clone(),
                    transformation: origin.transformation,
                    expression: output.expression.clone(),
                    file_path: ctx.file.to_string(),
                    statement_index: ctx.index,
                });
            }
        }
        self.produce(target, &names);
    }

    /// Process a query writing into `target`; returns its output columns
    fn query(
        &mut self,
        query: &QueryShape,
        target: Option<&str>,
        outer: &Scope,
        ctx: &mut StatementCtx<'_>,
    ) -> Vec<OutputColumn> {
        let mut scope = outer.clone();
        if query.recursive {
            for cte in &query.ctes {
                scope.push(&cte.name, cte_node_id(ctx.file, ctx.index, &cte.name));
            }
        }

        for cte in &query.ctes {
            let id = cte_node_id(ctx.file, ctx.index, &cte.name);
            self.out
                .ctes
                .entry(id.clone())
                .or_insert_with(|| (cte.name.to_lowercase(), ctx.file.to_string()));
            let outputs = self.query(&cte.query, Some(&id), &scope, ctx);
            self.write_columns(&id, &cte.columns, &outputs, ctx);
            if !query.recursive {
                scope.push(&cte.name, id);
            }
        }

        let mut outputs: Vec<OutputColumn> = Vec::new();
        for (i, branch) in query.branches.iter().enumerate() {
            let bound = self.bind(&branch.relations, target, &scope, ctx);
            let projected = self.project(branch, &bound);
            if i == 0 {
                outputs = projected;
                continue;
            }
            // Later set-operation branches feed the same output positions
            for (out, extra) in outputs.iter_mut().zip(projected) {
                for origin in extra.origins {
                    if !out.origins.contains(&origin) {
                        out.origins.push(origin);
                    }
                }
            }
        }

        for name in &query.nested_relations {
            let id = self.resolve_source(name, &scope, target);
            ctx.read(&id);
            if let Some(target) = target {
                ctx.edge(&id, target, EdgeType::Derived, None);
            }
        }

        outputs
    }

    fn bind(
        &mut self,
        relations: &[RelationShape],
        target: Option<&str>,
        scope: &Scope,
        ctx: &mut StatementCtx<'_>,
    ) -> Vec<Bound> {
        let mut bound = Vec::with_capacity(relations.len());
        for relation in relations {
            match &relation.source {
                RelationSource::Named(name) => {
                    let id = self.resolve_source(name, scope, target);
                    ctx.read(&id);
                    if let Some(target) = target {
                        ctx.edge(&id, target, EdgeType::Direct, Some(relation));
                    }
                    bound.push(Bound {
                        binding: relation.binding_name().map(str::to_string),
                        name: Some(name.clone()),
                        source: BoundSource::Node(id),
                        joined: relation.join.is_some(),
                    });
                }
                RelationSource::Derived(sub) => {
                    let outputs = self.query(sub, target, scope, ctx);
                    bound.push(Bound {
                        binding: relation.alias.clone(),
                        name: None,
                        source: BoundSource::Derived(outputs),
                        joined: relation.join.is_some(),
                    });
                }
            }
        }
        bound
    }

    fn project(&self, branch: &SelectShape, bound: &[Bound]) -> Vec<OutputColumn> {
        let mut outputs = Vec::new();
        for item in &branch.projection {
            if item.lineage.kind == ExprKind::Wildcard {
                self.expand_wildcard(item, bound, &mut outputs);
                continue;
            }

            let mut origins: Vec<Origin> = Vec::new();
            for source in item.lineage.sources.iter().filter(|s| !s.is_wildcard()) {
                let Some(relation) = self.relation_for(source, bound) else {
                    continue;
                };
                let transformation = classify(item, source, relation);
                for origin in self.origins(relation, &source.column, transformation) {
                    if !origins.contains(&origin) {
                        origins.push(origin);
                    }
                }
            }
            outputs.push(OutputColumn {
                name: item.output.clone(),
                origins,
                expression: Some(item.lineage.sql.clone()),
            });
        }
        outputs
    }

    fn expand_wildcard(&self, item: &ProjectionItem, bound: &[Bound], outputs: &mut Vec<OutputColumn>) {
        let qualifier = item.lineage.sources.first().and_then(|s| s.table.as_deref());
        for relation in bound
            .iter()
            .filter(|b| qualifier.map_or(true, |q| matches_qualifier(b, q)))
        {
            let transformation = if relation.joined {
                Transformation::Joined
            } else {
                Transformation::Passthrough
            };
            match self.bound_columns(relation) {
                Some(columns) => {
                    for column in columns {
                        outputs.push(OutputColumn {
                            origins: self.origins(relation, &column, transformation),
                            name: column,
                            expression: None,
                        });
                    }
                }
                None => outputs.push(OutputColumn {
                    name: "*".to_string(),
                    origins: self.origins(relation, "*", transformation),
                    expression: None,
                }),
            }
        }
    }

    /// Known column names of a bound relation, `None` when unknown
    fn bound_columns(&self, relation: &Bound) -> Option<Vec<String>> {
        match &relation.source {
            BoundSource::Node(id) => self.known_columns(id),
            BoundSource::Derived(outputs) => {
                if outputs.iter().any(|o| o.name == "*") {
                    None
                } else {
                    Some(outputs.iter().map(|o| o.name.clone()).collect())
                }
            }
        }
    }

    /// The relation a column reference reads from.
    ///
    /// Qualified references match alias, then name. Unqualified ones pick
    /// the only relation, else the first one known to have the column, else
    /// the first relation.
    fn relation_for<'b>(&self, column: &ColumnRef, bound: &'b [Bound]) -> Option<&'b Bound> {
        if let Some(qualifier) = &column.table {
            return bound.iter().find(|b| matches_qualifier(b, qualifier));
        }
        if bound.len() <= 1 {
            return bound.first();
        }
        bound
            .iter()
            .find(|b| {
                self.bound_columns(b)
                    .is_some_and(|cols| cols.iter().any(|c| *c == column.column))
            })
            .or_else(|| bound.first())
    }

    /// Base-table origins of `column` read through `relation`
    fn origins(&self, relation: &Bound, column: &str, transformation: Transformation) -> Vec<Origin> {
        match &relation.source {
            BoundSource::Node(id) => vec![Origin {
                node_id: id.clone(),
                column: column.to_string(),
                transformation,
            }],
            BoundSource::Derived(outputs) => {
                let compose = |inner: &Origin| Origin {
                    node_id: inner.node_id.clone(),
                    column: inner.column.clone(),
                    transformation: transformation.compose(inner.transformation),
                };
                if column == "*" {
                    return outputs
                        .iter()
                        .flat_map(|o| o.origins.iter().map(compose))
                        .collect();
                }
                if let Some(output) = outputs.iter().find(|o| o.name == column) {
                    return output.origins.iter().map(compose).collect();
                }
                // Column hidden behind an unexpanded `*` of the subquery
                outputs
                    .iter()
                    .filter(|o| o.name == "*")
                    .flat_map(|o| o.origins.iter())
                    .map(|inner| Origin {
                        node_id: inner.node_id.clone(),
                        column: column.to_string(),
                        transformation: transformation.compose(inner.transformation),
                    })
                    .collect()
            }
        }
    }
}

fn matches_qualifier(bound: &Bound, qualifier: &str) -> bool {
    if bound.binding.as_deref() == Some(qualifier) {
        return true;
    }
    bound
        .name
        .as_deref()
        .is_some_and(|name| name == qualifier || last_segment(name) == last_segment(qualifier))
}

/// Transformation label of one projection item for one of its sources
fn classify(item: &ProjectionItem, source: &ColumnRef, relation: &Bound) -> Transformation {
    match item.lineage.kind {
        ExprKind::Column if item.lineage.is_bare_column() => {
            if item.explicit_alias && item.output != source.column {
                Transformation::Renamed
            } else if relation.joined {
                Transformation::Joined
            } else {
                Transformation::Passthrough
            }
        }
        ExprKind::Aggregate => Transformation::Aggregated,
        _ => Transformation::Calculated,
    }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
