//! Lowering of collection operators into input fragments.

use tracing::warn;

use crate::ast::{
    Aggregate, ApplyKind, Binding, EntitySet, Expr, Field, GroupBinding, JoinKind,
    QuantifierKind, SortKey,
};
use crate::error::{GenResult, SqlGenError};
use crate::fragment::{
    Arena, ClauseKind, ColumnFragment, Fragment, Input, InputId, JoinFragment, SelectStatement,
    SortFragment, TableFragment, UnionFragment,
};
use crate::generator::Generator;
use crate::optimizer::fusion;

impl Generator {
    /// Lower an input, give it the binding's name and register it in scope.
    pub(crate) fn visit_input(&mut self, e: &Expr, name: Option<&str>) -> GenResult<InputId> {
        let id = self.input(e)?;
        if name.is_some() || !self.arena.get(id).is_scoped() {
            self.arena.set_name(id, name.map(str::to_string));
        }
        fusion::try_fuse(&mut self.arena, id);
        if let Some(n) = name {
            self.scope.bind(n, id);
        }
        Ok(id)
    }

    /// Like [`visit_input`](Self::visit_input), but always yields a select.
    pub(crate) fn ensure_select(&mut self, e: &Expr, name: Option<&str>) -> GenResult<InputId> {
        let id = self.visit_input(e, name)?;
        match self.arena.get(id) {
            Input::Select(_) => Ok(id),
            Input::Union(_) => {
                self.arena.wrap(id, &mut self.scope);
                Ok(self.new_select(id))
            }
            Input::Table(_) | Input::Join(_) => Ok(self.new_select(id)),
        }
    }

    fn new_select(&mut self, from: InputId) -> InputId {
        self.arena
            .alloc(Input::Select(SelectStatement::from_input(from)))
    }

    /// Wrap `id` into a fresh outer select unless it can take a clause of `kind`.
    pub(crate) fn wrap_if_not_compatible(&mut self, id: InputId, kind: ClauseKind) -> InputId {
        if self
            .arena
            .select(id)
            .is_some_and(|s| s.is_compatible(kind))
        {
            return id;
        }
        self.arena.wrap(id, &mut self.scope);
        self.new_select(id)
    }

    pub(crate) fn scan(&mut self, set: &EntitySet) -> InputId {
        let defining_query = set.defining_query.clone().filter(|_| !set.is_view);
        self.arena.alloc(Input::Table(TableFragment {
            schema: Some(set.schema.clone().unwrap_or_else(|| set.container.clone())),
            table: set.table_name().to_string(),
            defining_query,
            name: None,
            entity: set.element.clone(),
            scoped: false,
        }))
    }

    pub(crate) fn filter(&mut self, input: &Binding, predicate: &Expr) -> GenResult<InputId> {
        let select = self.ensure_select(&input.expr, Some(input.var.as_str()))?;
        let select = self.wrap_if_not_compatible(select, ClauseKind::Filter);
        let predicate = self.scalar(predicate)?;
        self.select_mut(select)?.where_clause = Some(predicate);
        Ok(select)
    }

    pub(crate) fn project(&mut self, input: &Binding, projection: &Expr) -> GenResult<InputId> {
        let select = self.ensure_select(&input.expr, Some(input.var.as_str()))?;
        let select = self.wrap_if_not_compatible(select, ClauseKind::Project);
        let Expr::NewInstance(fields) = projection else {
            return Err(SqlGenError::malformed("NewInstance", projection));
        };
        let columns = self.new_instance(fields)?;
        self.select_mut(select)?.columns.extend(columns);
        Ok(select)
    }

    /// Row constructor fields as projected columns aliased by field name.
    pub(crate) fn new_instance(&mut self, fields: &[Field]) -> GenResult<Vec<ColumnFragment>> {
        let mut columns = Vec::with_capacity(fields.len());
        for field in fields {
            let mut column = match self.scalar(&field.value)? {
                Fragment::Column(c) if c.literal.is_none() => c,
                other => ColumnFragment::computed(other),
            };
            column.alias = Some(field.name.clone());
            column.origin = vec![field.name.clone()];
            columns.push(column);
        }
        Ok(columns)
    }

    fn sort_keys(&mut self, keys: &[SortKey]) -> GenResult<Vec<SortFragment>> {
        keys.iter()
            .map(|k| {
                Ok(SortFragment {
                    expr: self.scalar(&k.expr)?,
                    ascending: k.ascending,
                })
            })
            .collect()
    }

    pub(crate) fn sort(&mut self, input: &Binding, keys: &[SortKey]) -> GenResult<InputId> {
        let select = self.ensure_select(&input.expr, Some(input.var.as_str()))?;
        let select = self.wrap_if_not_compatible(select, ClauseKind::Sort);
        let order_by = self.sort_keys(keys)?;
        self.select_mut(select)?.order_by.extend(order_by);
        Ok(select)
    }

    pub(crate) fn skip(
        &mut self,
        input: &Binding,
        keys: &[SortKey],
        count: &Expr,
    ) -> GenResult<InputId> {
        let select = self.ensure_select(&input.expr, Some(input.var.as_str()))?;
        let select = self.wrap_if_not_compatible(select, ClauseKind::Skip);
        let order_by = self.sort_keys(keys)?;
        let count = self.scalar(count)?;
        let s = self.select_mut(select)?;
        s.order_by.extend(order_by);
        s.skip = Some(count);
        Ok(select)
    }

    pub(crate) fn limit(&mut self, argument: &Expr, limit: Fragment) -> GenResult<InputId> {
        let select = self.ensure_select(argument, None)?;
        let select = self.wrap_if_not_compatible(select, ClauseKind::Limit);
        self.select_mut(select)?.limit = Some(limit);
        Ok(select)
    }

    pub(crate) fn distinct(&mut self, argument: &Expr) -> GenResult<InputId> {
        let select = self.ensure_select(argument, None)?;
        let select = self.wrap_if_not_compatible(select, ClauseKind::Distinct);
        self.select_mut(select)?.distinct = true;
        Ok(select)
    }

    /// Keys become GROUP BY entries (simple columns are also projected as
    /// `K1`, `K2`, ...); aggregates become aliased function columns.
    pub(crate) fn group_by(
        &mut self,
        input: &GroupBinding,
        keys: &[Field],
        aggregates: &[Aggregate],
    ) -> GenResult<InputId> {
        let inner = self.ensure_select(&input.expr, Some(input.var.as_str()))?;
        self.scope.bind(&input.group_var, inner);
        let select = self.wrap_if_not_compatible(inner, ClauseKind::GroupBy);

        for (i, key) in keys.iter().enumerate() {
            let fragment = self.scalar(&key.value)?;
            if let Fragment::Column(c) = &fragment {
                if c.literal.is_none() {
                    let mut projected = c.clone();
                    projected.alias = Some(format!("K{}", i + 1));
                    projected.origin = vec![key.name.clone()];
                    self.select_mut(select)?.columns.push(projected);
                }
            }
            self.select_mut(select)?.group_by.push(fragment);
        }
        for aggregate in aggregates {
            let args = aggregate
                .args
                .iter()
                .map(|a| self.scalar(a))
                .collect::<GenResult<Vec<_>>>()?;
            let function = self.aggregate(&aggregate.function, aggregate.distinct, args)?;
            let mut column = ColumnFragment::computed(function);
            column.alias = Some(aggregate.name.clone());
            column.origin = vec![aggregate.name.clone()];
            self.select_mut(select)?.columns.push(column);
        }
        Ok(select)
    }

    /// Selects and unions are isolated as derived tables; a join on the
    /// right-hand side gets a wrapping select.
    fn wrap_join_input(&mut self, id: InputId, is_right: bool) -> InputId {
        match self.arena.get(id) {
            Input::Select(_) | Input::Union(_) => {
                self.arena.wrap(id, &mut self.scope);
                id
            }
            Input::Join(j) if is_right => {
                let name = j.name.clone();
                let mut select = SelectStatement::from_input(id);
                select.name = name;
                let select = self.arena.alloc(Input::Select(select));
                self.arena.wrap(select, &mut self.scope);
                select
            }
            _ => id,
        }
    }

    pub(crate) fn join(
        &mut self,
        kind: JoinKind,
        left: &Binding,
        right: &Binding,
        condition: Option<&Expr>,
    ) -> GenResult<InputId> {
        let l = self.visit_input(&left.expr, Some(left.var.as_str()))?;
        let l = self.wrap_join_input(l, false);
        let r = self.visit_input(&right.expr, Some(right.var.as_str()))?;
        let r = self.wrap_join_input(r, true);
        let condition = match condition {
            Some(c) => Some(self.scalar(c)?),
            None => None,
        };
        Ok(self.arena.alloc(Input::Join(JoinFragment {
            kind,
            left: l,
            right: r,
            condition,
            name: None,
            scoped: false,
        })))
    }

    /// n-ary cross join as a left-deep chain.
    pub(crate) fn cross_join(&mut self, e: &Expr, inputs: &[Binding]) -> GenResult<InputId> {
        let [first, rest @ ..] = inputs else {
            return Err(SqlGenError::malformed("at least two inputs", e));
        };
        if rest.is_empty() {
            return Err(SqlGenError::malformed("at least two inputs", e));
        }
        let l = self.visit_input(&first.expr, Some(first.var.as_str()))?;
        let mut left = self.wrap_join_input(l, false);
        for binding in rest {
            let r = self.visit_input(&binding.expr, Some(binding.var.as_str()))?;
            let right = self.wrap_join_input(r, true);
            left = self.arena.alloc(Input::Join(JoinFragment {
                kind: JoinKind::Cross,
                left,
                right,
                condition: None,
                name: None,
                scoped: false,
            }));
        }
        Ok(left)
    }

    /// Apply: each output column of the dependent side becomes its own
    /// correlated scalar subquery carrying that side's clauses. Cross apply
    /// additionally keeps only rows where the dependent side is non-empty.
    pub(crate) fn apply(
        &mut self,
        kind: ApplyKind,
        input: &Binding,
        apply: &Binding,
    ) -> GenResult<InputId> {
        let input_id = self.visit_input(&input.expr, Some(input.var.as_str()))?;
        let apply_id = self.visit_input(&apply.expr, Some(apply.var.as_str()))?;

        let inner_table = self
            .arena
            .select(input_id)
            .and_then(|s| s.from)
            .and_then(|f| self.arena.name(f))
            .map(str::to_string);
        let input_id = self.wrap_join_input(input_id, true);
        let input_name = self.arena.name(input_id).unwrap_or(input.var.as_str()).to_string();

        let mut select = SelectStatement::from_input(input_id);
        for mut c in self.arena.output_columns(input_id) {
            c.origin.insert(0, input.var.clone());
            Arena::push_unique(&mut select.columns, c);
        }

        match self.arena.get(apply_id) {
            Input::Select(_) => {
                self.arena.wrap(apply_id, &mut self.scope);
                let Some(dependent) = self.arena.select(apply_id).cloned() else {
                    return Err(SqlGenError::malformed("select", self.arena.get(apply_id)));
                };
                let apply_name = dependent.name.clone();
                for f in &dependent.columns {
                    let output = f.output_name().unwrap_or(apply.var.as_str()).to_string();
                    let mut where_clause = dependent.where_clause.clone();
                    if let (Some(w), Some(old)) = (where_clause.as_mut(), inner_table.as_deref()) {
                        self.arena
                            .replace_table_name(w, Some(old), &input_name, None);
                    }
                    let per_column = self.arena.alloc(Input::Select(SelectStatement {
                        columns: vec![f.clone()],
                        default_columns: Vec::new(),
                        from: dependent.from,
                        where_clause,
                        group_by: dependent.group_by.clone(),
                        order_by: dependent.order_by.clone(),
                        skip: dependent.skip.clone(),
                        limit: dependent.limit.clone(),
                        distinct: dependent.distinct,
                        name: Some(output.clone()),
                        scoped: true,
                    }));
                    let mut column = ColumnFragment::computed(Fragment::Query(per_column));
                    column.table = apply_name.clone();
                    column.name = Some(output.clone());
                    column.alias = Some(output.clone());
                    column.origin = std::iter::once(apply.var.clone())
                        .chain(if f.origin.is_empty() {
                            vec![output]
                        } else {
                            f.origin.clone()
                        })
                        .collect();
                    Arena::push_unique(&mut select.columns, column);
                }
                if kind == ApplyKind::Cross {
                    select.where_clause = Some(Fragment::Exists {
                        input: apply_id,
                        negated: false,
                    });
                }
            }
            Input::Union(_) => {
                warn!(
                    apply = %apply.var,
                    "union on the dependent side of an apply is joined without de-correlation"
                );
                self.arena.wrap(apply_id, &mut self.scope);
                for mut c in self.arena.output_columns(apply_id) {
                    c.origin.insert(0, apply.var.clone());
                    Arena::push_unique(&mut select.columns, c);
                }
                let join = self.arena.alloc(Input::Join(JoinFragment {
                    kind: match kind {
                        ApplyKind::Cross => JoinKind::Inner,
                        ApplyKind::Outer => JoinKind::LeftOuter,
                    },
                    left: input_id,
                    right: apply_id,
                    condition: None,
                    name: None,
                    scoped: false,
                }));
                select.from = Some(join);
            }
            other => {
                return Err(SqlGenError::malformed("correlated select or union", other));
            }
        }
        select.scoped = true;
        Ok(self.arena.alloc(Input::Select(select)))
    }

    /// Both sides must be projections.
    pub(crate) fn union_all(&mut self, left: &Expr, right: &Expr) -> GenResult<InputId> {
        fn project_shaped(e: &Expr) -> bool {
            match e {
                Expr::Project { .. } | Expr::UnionAll { .. } => true,
                Expr::Distinct(inner) => project_shaped(inner),
                _ => false,
            }
        }
        for side in [left, right] {
            if !project_shaped(side) {
                return Err(SqlGenError::malformed("Project", side));
            }
        }
        let checkpoint = self.scope.checkpoint();
        let l = self.visit_input(left, None)?;
        self.scope.restore(checkpoint);
        let r = self.visit_input(right, None)?;
        self.scope.restore(checkpoint);
        Ok(self.arena.alloc(Input::Union(UnionFragment {
            left: l,
            right: r,
            name: None,
            scoped: false,
        })))
    }

    pub(crate) fn is_empty(&mut self, argument: &Expr) -> GenResult<Fragment> {
        let checkpoint = self.scope.checkpoint();
        let input = self.input(argument)?;
        self.scope.restore(checkpoint);
        Ok(Fragment::Exists {
            input,
            negated: true,
        })
    }

    /// Any: `EXISTS(... WHERE p)`. All: `NOT EXISTS(... WHERE NOT p)`.
    pub(crate) fn quantifier(
        &mut self,
        kind: QuantifierKind,
        input: &Binding,
        predicate: &Expr,
    ) -> GenResult<Fragment> {
        let checkpoint = self.scope.checkpoint();
        let select = self.ensure_select(&input.expr, Some(input.var.as_str()))?;
        let select = self.wrap_if_not_compatible(select, ClauseKind::Filter);
        let mut predicate = self.scalar(predicate)?;
        if kind == QuantifierKind::All {
            predicate = predicate.negate();
        }
        self.select_mut(select)?.where_clause = Some(predicate);
        self.scope.restore(checkpoint);
        Ok(Fragment::Exists {
            input: select,
            negated: kind == QuantifierKind::All,
        })
    }
}
