//! Page domain membership and user domain roles.

use folio_core::pages::{DomainRole, PageType, PairType};
use sqlx::PgExecutor;

use crate::models::domain::{DomainMember, DomainSource};

pub struct DomainRepo;

impl DomainRepo {
    /// Domains the page currently belongs to.
    pub async fn list_page_domains(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT domain_id FROM page_domain_pairs WHERE page_id = $1 ORDER BY domain_id",
        )
        .bind(page_id)
        .fetch_all(executor)
        .await
    }

    /// Domains the page should belong to: its own id if it is a domain page,
    /// plus the domains of its published parents.
    pub async fn list_domain_sources(
        executor: impl PgExecutor<'_>,
        page_id: &str,
    ) -> Result<Vec<DomainSource>, sqlx::Error> {
        sqlx::query_as::<_, DomainSource>(
            "SELECT pi.page_id AS domain_id, pi.see_domain_id \
             FROM page_infos AS pi \
             WHERE pi.page_id = $1 AND pi.type = $2 \
             UNION \
             SELECT pdp.domain_id, parent.see_domain_id \
             FROM page_pairs AS pp \
             JOIN page_infos AS parent ON parent.page_id = pp.parent_id \
             JOIN page_domain_pairs AS pdp ON pdp.page_id = pp.parent_id \
             WHERE pp.child_id = $1 AND pp.type = $3 \
               AND parent.current_edit > 0 AND NOT parent.is_deleted",
        )
        .bind(page_id)
        .bind(PageType::Domain.as_str())
        .bind(PairType::Parent.as_str())
        .fetch_all(executor)
        .await
    }

    pub async fn add_page_domains(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        domain_ids: &[String],
    ) -> Result<u64, sqlx::Error> {
        if domain_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO page_domain_pairs (page_id, domain_id) \
             SELECT $1, d FROM UNNEST($2::TEXT[]) AS d \
             ON CONFLICT DO NOTHING",
        )
        .bind(page_id)
        .bind(domain_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn remove_page_domains(
        executor: impl PgExecutor<'_>,
        page_id: &str,
        domain_ids: &[String],
    ) -> Result<u64, sqlx::Error> {
        if domain_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "DELETE FROM page_domain_pairs WHERE page_id = $1 AND domain_id = ANY($2)",
        )
        .bind(page_id)
        .bind(domain_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_roles_for_user(
        executor: impl PgExecutor<'_>,
        user_id: &str,
    ) -> Result<Vec<DomainMember>, sqlx::Error> {
        sqlx::query_as::<_, DomainMember>(
            "SELECT domain_id, user_id, role FROM domain_members WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Insert or change a membership.
    pub async fn set_member_role(
        executor: impl PgExecutor<'_>,
        domain_id: &str,
        user_id: &str,
        role: DomainRole,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO domain_members (domain_id, user_id, role) VALUES ($1, $2, $3) \
             ON CONFLICT (domain_id, user_id) DO UPDATE SET role = EXCLUDED.role",
        )
        .bind(domain_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(executor)
        .await?;
        Ok(())
    }
}
