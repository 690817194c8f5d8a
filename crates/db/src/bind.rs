use folio_core::query::QueryArg;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::Postgres;

/// Bind rendered [`QueryArg`]s in placeholder order.
pub fn bind_query_as<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    args: &'q [QueryArg],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for arg in args {
        query = match arg {
            QueryArg::Text(v) => query.bind(v.as_str()),
            QueryArg::Int(v) => query.bind(*v),
            QueryArg::Bool(v) => query.bind(*v),
            QueryArg::TextList(v) => query.bind(v.as_slice()),
        };
    }
    query
}

/// [`bind_query_as`] for single-column queries.
pub fn bind_query_scalar<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    args: &'q [QueryArg],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for arg in args {
        query = match arg {
            QueryArg::Text(v) => query.bind(v.as_str()),
            QueryArg::Int(v) => query.bind(*v),
            QueryArg::Bool(v) => query.bind(*v),
            QueryArg::TextList(v) => query.bind(v.as_slice()),
        };
    }
    query
}
