//! Composable SQL fragments with bound arguments.
//!
//! Fragments are written with `?` placeholders and combined with
//! [`QueryPart::and`], [`QueryPart::or`] and [`QueryPart::not`]. Rendering
//! numbers the placeholders `$n` for Postgres, starting at whatever index the
//! surrounding statement needs. Values are never spliced into SQL text.

/// A bound value carried alongside a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryArg {
    Text(String),
    Int(i64),
    Bool(bool),
    TextList(Vec<String>),
}

impl From<&str> for QueryArg {
    fn from(v: &str) -> Self {
        QueryArg::Text(v.to_string())
    }
}

impl From<String> for QueryArg {
    fn from(v: String) -> Self {
        QueryArg::Text(v)
    }
}

impl From<i64> for QueryArg {
    fn from(v: i64) -> Self {
        QueryArg::Int(v)
    }
}

impl From<i32> for QueryArg {
    fn from(v: i32) -> Self {
        QueryArg::Int(i64::from(v))
    }
}

impl From<bool> for QueryArg {
    fn from(v: bool) -> Self {
        QueryArg::Bool(v)
    }
}

impl From<Vec<String>> for QueryArg {
    fn from(v: Vec<String>) -> Self {
        QueryArg::TextList(v)
    }
}

/// SQL text with `?` placeholders and the arguments that fill them, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPart {
    sql: String,
    args: Vec<QueryArg>,
}

impl QueryPart {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// A predicate that matches every row.
    pub fn always_true() -> Self {
        Self::new("TRUE")
    }

    /// Append an argument for the next unfilled placeholder.
    pub fn arg(mut self, arg: impl Into<QueryArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn and(self, other: QueryPart) -> Self {
        self.combine("AND", other)
    }

    pub fn or(self, other: QueryPart) -> Self {
        self.combine("OR", other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self {
            sql: format!("NOT ({})", self.sql),
            args: self.args,
        }
    }

    fn combine(mut self, op: &str, other: QueryPart) -> Self {
        self.sql = format!("({}) {op} ({})", self.sql, other.sql);
        self.args.extend(other.args);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[QueryArg] {
        &self.args
    }

    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }

    /// Replace each `?` with `$first_index`, `$first_index + 1`, ...
    ///
    /// Returns the rendered SQL and the next free placeholder index.
    pub fn render(&self, first_index: usize) -> (String, usize) {
        let mut out = String::with_capacity(self.sql.len() + 8);
        let mut index = first_index;
        for ch in self.sql.chars() {
            if ch == '?' {
                out.push('$');
                out.push_str(&index.to_string());
                index += 1;
            } else {
                out.push(ch);
            }
        }
        (out, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_numbers_placeholders_from_offset() {
        let part = QueryPart::new("a = ? AND b = ?").arg("x").arg(3i64);
        let (sql, next) = part.render(2);
        assert_eq!(sql, "a = $2 AND b = $3");
        assert_eq!(next, 4);
        assert_eq!(part.args(), &[QueryArg::Text("x".into()), QueryArg::Int(3)]);
    }

    #[test]
    fn combinators_keep_argument_order() {
        let part = QueryPart::new("a = ?")
            .arg(1)
            .and(QueryPart::new("b = ?").arg(2).or(QueryPart::new("c").not()));
        assert_eq!(part.sql(), "(a = ?) AND ((b = ?) OR (NOT (c)))");
        assert_eq!(part.args(), &[QueryArg::Int(1), QueryArg::Int(2)]);
        assert_eq!(part.placeholder_count(), part.args().len());
    }

    #[test]
    fn always_true_has_no_args() {
        let (sql, next) = QueryPart::always_true().render(1);
        assert_eq!(sql, "TRUE");
        assert_eq!(next, 1);
    }
}
