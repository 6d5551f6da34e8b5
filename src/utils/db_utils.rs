use sqlx::{MySql, QueryBuilder};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
}

/// ===============================
/// WHERE clause container
/// ===============================
/// Collects `column <op> ?` conditions so the same filter can be pushed into
/// both the COUNT and the page query of a listing.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(&'static str, SqlValue),
    In(&'static str, Vec<SqlValue>),
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: SqlValue) -> Self {
        self.conditions.push(Condition::Eq(column, value));
        self
    }

    pub fn eq_opt(self, column: &'static str, value: Option<SqlValue>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    /// An empty list matches nothing.
    pub fn in_list(mut self, column: &'static str, values: Vec<SqlValue>) -> Self {
        self.conditions.push(Condition::In(column, values));
        self
    }

    /// Appends ` WHERE ...` (or nothing) to the builder.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, MySql>) {
        for (i, condition) in self.conditions.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });

            match condition {
                Condition::Eq(column, value) => {
                    qb.push(*column).push(" = ");
                    push_value(qb, value.clone());
                }
                Condition::In(_, values) if values.is_empty() => {
                    qb.push("1 = 0");
                }
                Condition::In(column, values) => {
                    qb.push(*column).push(" IN (");
                    for (j, value) in values.iter().enumerate() {
                        if j > 0 {
                            qb.push(", ");
                        }
                        push_value(qb, value.clone());
                    }
                    qb.push(")");
                }
            }
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'_, MySql>, value: SqlValue) {
    match value {
        SqlValue::String(v) => qb.push_bind(v),
        SqlValue::U64(v) => qb.push_bind(v),
    };
}
