//! Input fragments (tables, selects, joins, unions) and the arena owning them.

use std::collections::HashMap;

use crate::ast::{EntityType, JoinKind};
use crate::fragment::{ColumnFragment, Fragment};
use crate::scope::Scope;

/// Index of an input fragment in its [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub struct TableFragment {
    pub schema: Option<String>,
    pub table: String,
    /// Raw SQL standing in for the table.
    pub defining_query: Option<String>,
    pub name: Option<String>,
    pub entity: EntityType,
    pub scoped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortFragment {
    pub expr: Fragment,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub columns: Vec<ColumnFragment>,
    /// Columns rendered when `columns` is empty (inherited through fusion).
    pub default_columns: Vec<ColumnFragment>,
    pub from: Option<InputId>,
    pub where_clause: Option<Fragment>,
    pub group_by: Vec<Fragment>,
    pub order_by: Vec<SortFragment>,
    pub skip: Option<Fragment>,
    pub limit: Option<Fragment>,
    pub distinct: bool,
    pub name: Option<String>,
    /// Set once the select is wrapped and only addressable through its outputs.
    pub scoped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinFragment {
    pub kind: JoinKind,
    pub left: InputId,
    pub right: InputId,
    pub condition: Option<Fragment>,
    pub name: Option<String>,
    pub scoped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionFragment {
    pub left: InputId,
    pub right: InputId,
    pub name: Option<String>,
    pub scoped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Table(TableFragment),
    Select(SelectStatement),
    Join(JoinFragment),
    Union(UnionFragment),
}

impl Input {
    pub fn name(&self) -> Option<&str> {
        match self {
            Input::Table(t) => t.name.as_deref(),
            Input::Select(s) => s.name.as_deref(),
            Input::Join(j) => j.name.as_deref(),
            Input::Union(u) => u.name.as_deref(),
        }
    }

    pub fn set_name(&mut self, name: Option<String>) {
        match self {
            Input::Table(t) => t.name = name,
            Input::Select(s) => s.name = name,
            Input::Join(j) => j.name = name,
            Input::Union(u) => u.name = name,
        }
    }

    pub fn is_scoped(&self) -> bool {
        match self {
            Input::Table(t) => t.scoped,
            Input::Select(s) => s.scoped,
            Input::Join(j) => j.scoped,
            Input::Union(u) => u.scoped,
        }
    }

    fn set_scoped(&mut self) {
        match self {
            Input::Table(t) => t.scoped = true,
            Input::Select(s) => s.scoped = true,
            Input::Join(j) => j.scoped = true,
            Input::Union(u) => u.scoped = true,
        }
    }
}

/// Clause kinds a select can receive, in SQL evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Filter,
    GroupBy,
    Project,
    Distinct,
    Sort,
    Skip,
    Limit,
}

impl SelectStatement {
    pub fn from_input(from: InputId) -> Self {
        Self {
            from: Some(from),
            ..Default::default()
        }
    }

    /// Whether a clause of `kind` can be attached without wrapping.
    ///
    /// Evaluation order is FROM, WHERE, GROUP BY, projection, DISTINCT,
    /// ORDER BY, SKIP, LIMIT; a clause cannot be added beneath one that
    /// already follows it.
    pub fn is_compatible(&self, kind: ClauseKind) -> bool {
        match kind {
            ClauseKind::Filter => {
                self.where_clause.is_none()
                    && self.columns.is_empty()
                    && self.group_by.is_empty()
                    && self.skip.is_none()
                    && self.limit.is_none()
                    && !self.distinct
            }
            ClauseKind::GroupBy => {
                self.columns.is_empty()
                    && self.group_by.is_empty()
                    && self.order_by.is_empty()
                    && self.skip.is_none()
                    && self.limit.is_none()
                    && !self.distinct
            }
            ClauseKind::Project => {
                self.columns.is_empty() && self.group_by.is_empty() && !self.distinct
            }
            ClauseKind::Distinct => {
                self.limit.is_none() && self.skip.is_none() && self.order_by.is_empty()
            }
            ClauseKind::Sort => {
                self.columns.is_empty()
                    && self.group_by.is_empty()
                    && self.order_by.is_empty()
                    && self.skip.is_none()
                    && self.limit.is_none()
                    && !self.distinct
            }
            ClauseKind::Skip => {
                self.columns.is_empty()
                    && self.group_by.is_empty()
                    && self.order_by.is_empty()
                    && self.skip.is_none()
                    && self.limit.is_none()
                    && !self.distinct
            }
            ClauseKind::Limit => self.limit.is_none() && self.skip.is_none(),
        }
    }

    /// Columns this select projects.
    pub fn output_columns(&self) -> &[ColumnFragment] {
        if self.columns.is_empty() {
            &self.default_columns
        } else {
            &self.columns
        }
    }
}

/// Owner of every input fragment produced while generating one statement.
#[derive(Debug, Default)]
pub struct Arena {
    inputs: Vec<Input>,
    aliases: usize,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, input: Input) -> InputId {
        self.inputs.push(input);
        InputId(self.inputs.len() - 1)
    }

    pub fn get(&self, id: InputId) -> &Input {
        &self.inputs[id.0]
    }

    pub fn get_mut(&mut self, id: InputId) -> &mut Input {
        &mut self.inputs[id.0]
    }

    pub fn select(&self, id: InputId) -> Option<&SelectStatement> {
        match self.get(id) {
            Input::Select(s) => Some(s),
            _ => None,
        }
    }

    pub fn select_mut(&mut self, id: InputId) -> Option<&mut SelectStatement> {
        match self.get_mut(id) {
            Input::Select(s) => Some(s),
            _ => None,
        }
    }

    pub fn table(&self, id: InputId) -> Option<&TableFragment> {
        match self.get(id) {
            Input::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn name(&self, id: InputId) -> Option<&str> {
        self.get(id).name()
    }

    pub fn set_name(&mut self, id: InputId, name: Option<String>) {
        self.get_mut(id).set_name(name);
    }

    pub fn next_alias(&mut self) -> String {
        self.aliases += 1;
        format!("Alias{}", self.aliases)
    }

    /// Columns visible through `id` once it is wrapped, qualified by its name.
    pub fn output_columns(&self, id: InputId) -> Vec<ColumnFragment> {
        let owner = self.name(id).map(str::to_string);
        match self.get(id) {
            Input::Table(t) => t
                .entity
                .properties
                .iter()
                .map(|p| {
                    let mut c = ColumnFragment::new(owner.clone(), p.name.clone());
                    c.origin = vec![p.name.clone()];
                    c
                })
                .collect(),
            Input::Select(s) => Self::requalify(s.output_columns(), &owner),
            Input::Union(u) => match self.select(u.left) {
                Some(left) => Self::requalify(left.output_columns(), &owner),
                None => self.output_columns(u.left),
            },
            Input::Join(_) => {
                let mut columns = Vec::new();
                self.join_columns(id, &mut columns);
                columns
            }
        }
    }

    fn requalify(columns: &[ColumnFragment], owner: &Option<String>) -> Vec<ColumnFragment> {
        columns
            .iter()
            .filter_map(|c| {
                let name = c.output_name()?;
                let mut out = ColumnFragment::new(owner.clone(), name);
                out.origin = if c.origin.is_empty() {
                    vec![name.to_string()]
                } else {
                    c.origin.clone()
                };
                Some(out)
            })
            .collect()
    }

    /// Columns of both join sides, origins prefixed by side name, aliases de-duplicated.
    fn join_columns(&self, id: InputId, out: &mut Vec<ColumnFragment>) {
        let Input::Join(join) = self.get(id) else {
            return;
        };
        for side in [join.left, join.right] {
            if matches!(self.get(side), Input::Join(_)) {
                let mut nested = Vec::new();
                self.join_columns(side, &mut nested);
                for c in nested {
                    Self::push_unique(out, c);
                }
                continue;
            }
            let prefix = self.name(side).map(str::to_string);
            for mut c in self.output_columns(side) {
                if let Some(p) = &prefix {
                    c.origin.insert(0, p.clone());
                }
                Self::push_unique(out, c);
            }
        }
    }

    pub(crate) fn push_unique(out: &mut Vec<ColumnFragment>, mut column: ColumnFragment) {
        let taken = |out: &Vec<ColumnFragment>, name: &str| {
            out.iter().any(|c| c.output_name() == Some(name))
        };
        if let Some(name) = column.output_name().map(str::to_string) {
            if taken(out, &name) {
                let mut n = 1;
                while taken(out, &format!("{}{}", name, n)) {
                    n += 1;
                }
                column.alias = Some(format!("{}{}", name, n));
            }
        }
        out.push(column);
    }

    /// Inputs nested directly under `id`, descending through joins.
    pub fn child_inputs(&self, id: InputId) -> Vec<InputId> {
        let mut out = Vec::new();
        let direct = match self.get(id) {
            Input::Table(_) => vec![],
            Input::Select(s) => s.from.into_iter().collect(),
            Input::Join(j) => vec![j.left, j.right],
            Input::Union(u) => vec![u.left, u.right],
        };
        for child in direct {
            out.push(child);
            if matches!(self.get(child), Input::Join(_)) {
                out.extend(self.child_inputs(child));
            }
        }
        out
    }

    /// Isolate `id` as a named subquery: materialize its default columns,
    /// hide its inner inputs from the scope and bind it under its own name.
    pub fn wrap(&mut self, id: InputId, scope: &mut Scope) {
        let name = match self.name(id) {
            Some(n) => n.to_string(),
            None => {
                let n = self.next_alias();
                self.set_name(id, Some(n.clone()));
                n
            }
        };
        if let Some(select) = self.select(id) {
            if select.columns.is_empty() {
                let columns = if !select.default_columns.is_empty() {
                    select.default_columns.clone()
                } else if let Some(from) = select.from {
                    self.output_columns(from)
                } else {
                    Vec::new()
                };
                if let Some(select) = self.select_mut(id) {
                    select.columns = columns;
                }
            }
        }
        self.get_mut(id).set_scoped();
        for child in self.child_inputs(id) {
            scope.unbind_input(child);
        }
        scope.bind(&name, id);
    }

    /// Point references to `old` at `new` inside `fragment` and every subquery
    /// it reaches; references to `new` whose column is a key of `renames` take
    /// the mapped source name.
    pub fn replace_table_name(
        &mut self,
        fragment: &mut Fragment,
        old: Option<&str>,
        new: &str,
        renames: Option<&HashMap<String, ColumnFragment>>,
    ) {
        fragment.for_each_column_mut(&mut |c| rename_column(c, old, new, renames));
        let mut nested = Vec::new();
        fragment.collect_inputs(&mut nested);
        for id in nested {
            self.replace_table_name_in_input(id, old, new, renames, 0);
        }
    }

    fn replace_table_name_in_input(
        &mut self,
        id: InputId,
        old: Option<&str>,
        new: &str,
        renames: Option<&HashMap<String, ColumnFragment>>,
        depth: usize,
    ) {
        if depth > self.inputs.len() {
            return;
        }
        let mut nested = Vec::new();
        let visit = |f: &mut Fragment, nested: &mut Vec<InputId>| {
            f.for_each_column_mut(&mut |c| rename_column(c, old, new, renames));
            f.collect_inputs(nested);
        };
        match self.get_mut(id) {
            Input::Select(s) => {
                for c in s.columns.iter_mut().chain(s.default_columns.iter_mut()) {
                    if let Some(lit) = c.literal.as_mut() {
                        visit(lit, &mut nested);
                    }
                    rename_column(c, old, new, renames);
                }
                for f in s
                    .where_clause
                    .iter_mut()
                    .chain(s.group_by.iter_mut())
                    .chain(s.order_by.iter_mut().map(|o| &mut o.expr))
                    .chain(s.skip.iter_mut())
                    .chain(s.limit.iter_mut())
                {
                    visit(f, &mut nested);
                }
                nested.extend(s.from);
            }
            Input::Join(j) => {
                if let Some(c) = j.condition.as_mut() {
                    visit(c, &mut nested);
                }
                nested.push(j.left);
                nested.push(j.right);
            }
            Input::Union(u) => {
                nested.push(u.left);
                nested.push(u.right);
            }
            Input::Table(_) => {}
        }
        for child in nested {
            self.replace_table_name_in_input(child, old, new, renames, depth + 1);
        }
    }
}

fn rename_column(
    c: &mut ColumnFragment,
    old: Option<&str>,
    new: &str,
    renames: Option<&HashMap<String, ColumnFragment>>,
) {
    if old.is_some() && c.table.as_deref() == old {
        c.table = Some(new.to_string());
    } else if c.table.as_deref() == Some(new) {
        let source = renames
            .zip(c.name.as_ref())
            .and_then(|(map, name)| map.get(name))
            .and_then(|src| src.name.clone());
        if let Some(source) = source {
            c.name = Some(source);
        }
    }
}
