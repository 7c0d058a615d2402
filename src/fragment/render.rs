//! SQL text rendering of fragments.

use crate::dialect::SqlDialect;
use crate::fragment::{
    Arena, BinaryFragment, ColumnFragment, Fragment, Input, InputId, SelectStatement,
    UnionFragment,
};

/// Renders fragments and arena inputs through a dialect.
pub struct SqlWriter<'a> {
    arena: &'a Arena,
    dialect: &'a dyn SqlDialect,
}

impl<'a> SqlWriter<'a> {
    pub fn new(arena: &'a Arena, dialect: &'a dyn SqlDialect) -> Self {
        Self { arena, dialect }
    }

    /// Render an input as a complete query.
    pub fn query(&self, id: InputId) -> String {
        let mut out = String::new();
        self.write_query(&mut out, id);
        out
    }

    pub fn fragment(&self, f: &Fragment) -> String {
        let mut out = String::new();
        self.write_fragment(&mut out, f);
        out
    }

    fn q(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    pub fn write_query(&self, out: &mut String, id: InputId) {
        match self.arena.get(id) {
            Input::Select(s) => self.write_select(out, s),
            Input::Union(u) => self.write_union(out, u),
            Input::Table(_) | Input::Join(_) => {
                out.push_str("SELECT * FROM ");
                self.write_from(out, id);
            }
        }
    }

    pub fn write_select(&self, out: &mut String, s: &SelectStatement) {
        out.push_str("SELECT ");
        if s.distinct {
            out.push_str("DISTINCT ");
        }
        let columns = s.output_columns();
        if columns.is_empty() {
            out.push('*');
        } else {
            for (i, c) in columns.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                self.write_projection(out, c);
            }
        }
        if let Some(from) = s.from {
            out.push_str(" FROM ");
            self.write_from(out, from);
        }
        if s.where_clause.is_some() || s.skip.is_some() {
            out.push_str(" WHERE ");
            if let Some(w) = &s.where_clause {
                let wrap = s.skip.is_some() && matches!(w, Fragment::Binary(b) if b.op == "OR");
                self.write_wrapped(out, w, wrap);
                if s.skip.is_some() {
                    out.push_str(" AND ");
                }
            }
            if let Some(skip) = &s.skip {
                out.push_str(self.dialect.row_index());
                out.push_str(" > ");
                self.write_fragment(out, skip);
            }
        }
        if !s.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            self.write_list(out, &s.group_by);
        }
        if !s.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            for (i, o) in s.order_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                self.write_fragment(out, &o.expr);
                if !o.ascending {
                    out.push_str(" DESC");
                }
            }
        }
        if let Some(limit) = &s.limit {
            out.push_str(" LIMIT ");
            self.write_fragment(out, limit);
        }
    }

    fn write_union(&self, out: &mut String, u: &UnionFragment) {
        out.push('(');
        self.write_query(out, u.left);
        out.push_str(") UNION ALL (");
        self.write_query(out, u.right);
        out.push(')');
    }

    fn write_alias(&self, out: &mut String, name: Option<&str>) {
        if let Some(n) = name {
            out.push_str(" AS ");
            out.push_str(&self.q(n));
        }
    }

    /// Render an input in `FROM` position.
    pub fn write_from(&self, out: &mut String, id: InputId) {
        match self.arena.get(id) {
            Input::Table(t) => {
                match &t.defining_query {
                    Some(query) => {
                        out.push('(');
                        out.push_str(query.trim());
                        out.push(')');
                    }
                    None => out.push_str(&self.dialect.table_name(t.schema.as_deref(), &t.table)),
                }
                self.write_alias(out, t.name.as_deref());
            }
            Input::Select(s) => {
                out.push('(');
                self.write_select(out, s);
                out.push(')');
                self.write_alias(out, s.name.as_deref());
            }
            Input::Union(u) => {
                out.push('(');
                self.write_union(out, u);
                out.push(')');
                self.write_alias(out, u.name.as_deref());
            }
            Input::Join(j) => {
                self.write_from(out, j.left);
                out.push(' ');
                out.push_str(j.kind.as_sql());
                out.push(' ');
                self.write_from(out, j.right);
                match &j.condition {
                    Some(c) => {
                        out.push_str(" ON ");
                        self.write_fragment(out, c);
                    }
                    None if j.kind != crate::ast::JoinKind::Cross => out.push_str(" ON 1 = 1"),
                    None => {}
                }
            }
        }
    }

    fn write_projection(&self, out: &mut String, c: &ColumnFragment) {
        self.write_column(out, c);
        if let Some(alias) = &c.alias {
            if c.literal.is_some() || c.name.as_ref() != Some(alias) {
                out.push_str(" AS ");
                out.push_str(&self.q(alias));
            }
        }
    }

    fn write_column(&self, out: &mut String, c: &ColumnFragment) {
        if let Some(lit) = &c.literal {
            self.write_fragment(out, lit);
            return;
        }
        if let Some(t) = &c.table {
            out.push_str(&self.q(t));
            out.push('.');
        }
        match &c.name {
            Some(n) => out.push_str(&self.q(n)),
            None => out.push('*'),
        }
    }

    fn write_list(&self, out: &mut String, items: &[Fragment]) {
        for (i, f) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_fragment(out, f);
        }
    }

    fn write_wrapped(&self, out: &mut String, f: &Fragment, wrap: bool) {
        if wrap {
            out.push('(');
        }
        self.write_fragment(out, f);
        if wrap {
            out.push(')');
        }
    }

    fn write_binary(&self, out: &mut String, b: &BinaryFragment) {
        if b.negated {
            out.push_str("NOT (");
        }
        self.write_wrapped(out, &b.left, b.wrap_left);
        out.push(' ');
        out.push_str(b.op);
        out.push(' ');
        self.write_wrapped(out, &b.right, b.wrap_right);
        if b.negated {
            out.push(')');
        }
    }

    fn write_template(&self, out: &mut String, template: &str, args: &[Fragment]) {
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let index = after
                .find('}')
                .and_then(|close| after[..close].parse::<usize>().ok().map(|n| (n, close)));
            match index {
                Some((n, close)) => {
                    if let Some(arg) = args.get(n) {
                        self.write_fragment(out, arg);
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
    }

    pub fn write_fragment(&self, out: &mut String, f: &Fragment) {
        match f {
            Fragment::Literal(text) => out.push_str(text),
            Fragment::Column(c) => self.write_column(out, c),
            Fragment::Binary(b) => self.write_binary(out, b),
            Fragment::Function {
                name,
                args,
                distinct,
                niladic,
            } => {
                out.push_str(name);
                if !niladic {
                    out.push('(');
                    if *distinct {
                        out.push_str("DISTINCT ");
                    }
                    self.write_list(out, args);
                    out.push(')');
                }
            }
            Fragment::Template { template, args } => self.write_template(out, template, args),
            Fragment::List(items) => self.write_list(out, items),
            Fragment::In {
                argument,
                list,
                negated,
            } => {
                self.write_fragment(out, argument);
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                self.write_list(out, list);
                out.push(')');
            }
            Fragment::Like {
                argument,
                pattern,
                escape,
                negated,
            } => {
                self.write_fragment(out, argument);
                out.push_str(if *negated { " NOT LIKE " } else { " LIKE " });
                self.write_fragment(out, pattern);
                if let Some(e) = escape {
                    out.push_str(" ESCAPE ");
                    self.write_fragment(out, e);
                }
            }
            Fragment::IsNull { argument, negated } => {
                self.write_fragment(out, argument);
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Fragment::Case {
                branches,
                otherwise,
            } => {
                out.push_str("CASE");
                for (when, then) in branches {
                    out.push_str(" WHEN ");
                    self.write_fragment(out, when);
                    out.push_str(" THEN ");
                    self.write_fragment(out, then);
                }
                if let Some(o) = otherwise {
                    out.push_str(" ELSE ");
                    self.write_fragment(out, o);
                }
                out.push_str(" END");
            }
            Fragment::Exists { input, negated } => {
                out.push_str(if *negated { "NOT EXISTS(" } else { "EXISTS(" });
                self.write_query(out, *input);
                out.push(')');
            }
            Fragment::Query(input) => {
                out.push('(');
                self.write_query(out, *input);
                out.push(')');
            }
            Fragment::Not(inner) => {
                out.push_str("NOT (");
                self.write_fragment(out, inner);
                out.push(')');
            }
        }
    }
}
