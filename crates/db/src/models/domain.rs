use sqlx::FromRow;

/// A domain the page should belong to, from its parents or because it is a
/// domain root.
#[derive(Debug, Clone, FromRow)]
pub struct DomainSource {
    pub domain_id: String,
    /// Domain of the page the membership is inherited through.
    pub see_domain_id: String,
}

/// A row from the `domain_members` table.
#[derive(Debug, Clone, FromRow)]
pub struct DomainMember {
    pub domain_id: String,
    pub user_id: String,
    pub role: String,
}
