//! Linking won leads to storefront business accounts.
//!
//! A link copies the business's display fields onto the lead as a snapshot.
//! The snapshot is refreshed on every link and dropped on unlink; a later
//! rename of the business does not reach it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::lifecycle::commit_lead;
use crate::error::{LeadError, LeadResult};
use crate::models::{Business, BusinessSnapshot, Lead, LeadStatus};
use crate::store::{BusinessDirectory, LeadStore};

/// Result of a business directory search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSearch {
    pub businesses: Vec<Business>,
    /// Exactly one business carries the searched email
    pub exact_match: bool,
}

/// What to search the directory by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusinessQuery {
    Text(String),
    Email(String),
}

pub fn search_businesses<D: BusinessDirectory + ?Sized>(
    directory: &D,
    query: &BusinessQuery,
    limit: usize,
) -> LeadResult<BusinessSearch> {
    match query {
        BusinessQuery::Email(email) => {
            let email = email.trim();
            if email.is_empty() {
                return Ok(BusinessSearch {
                    businesses: Vec::new(),
                    exact_match: false,
                });
            }
            let mut businesses = directory.find_businesses_by_email(email)?;
            let exact_match = businesses.len() == 1;
            businesses.truncate(limit);
            Ok(BusinessSearch {
                businesses,
                exact_match,
            })
        }
        BusinessQuery::Text(text) => {
            let needle = text.trim().to_lowercase();
            if needle.is_empty() {
                return Ok(BusinessSearch {
                    businesses: Vec::new(),
                    exact_match: false,
                });
            }
            let mut businesses = directory.search_businesses(&needle)?;
            businesses.sort_by(|a, b| {
                search_rank(a, &needle)
                    .cmp(&search_rank(b, &needle))
                    .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            });
            let exact_match = businesses.iter().filter(|b| b.has_email(&needle)).count() == 1;
            businesses.truncate(limit);
            Ok(BusinessSearch {
                businesses,
                exact_match,
            })
        }
    }
}

/// Lower is better: exact email, name prefix, slug prefix, anything else
fn search_rank(business: &Business, needle: &str) -> u8 {
    if business.has_email(needle) {
        0
    } else if business.name.to_lowercase().starts_with(needle) {
        1
    } else if business.slug.to_lowercase().starts_with(needle) {
        2
    } else {
        3
    }
}

/// Point a lead at a business. `converted_at` is only stamped the first time.
pub(crate) fn apply_link(lead: &mut Lead, business: &Business, now: DateTime<Utc>) {
    lead.converted_to_id = Some(business.id);
    lead.converted_to = Some(business.snapshot());
    lead.converted_at.get_or_insert(now);
    lead.pending_conversion_id = None;
}

/// Link a lead to the single business sharing its email, if there is one.
/// Does nothing when the lead has no email or is already linked.
pub fn auto_match_by_email<D: BusinessDirectory + ?Sized>(
    directory: &D,
    lead: &mut Lead,
    now: DateTime<Utc>,
) -> LeadResult<Option<BusinessSnapshot>> {
    if lead.converted_to_id.is_some() {
        return Ok(None);
    }
    let Some(email) = lead.email.clone() else {
        return Ok(None);
    };

    let search = search_businesses(directory, &BusinessQuery::Email(email), usize::MAX)?;
    if !search.exact_match {
        tracing::debug!(
            lead_id = %lead.id,
            candidates = search.businesses.len(),
            "no unambiguous business for lead email"
        );
        return Ok(None);
    }

    let business = &search.businesses[0];
    apply_link(lead, business, now);
    tracing::info!(lead_id = %lead.id, business_id = %business.id, "auto-linked lead by email");
    Ok(lead.converted_to.clone())
}

/// Link a lead to a business picked by an operator.
///
/// Won leads are linked right away. Open leads keep the choice as a pending
/// link, promoted once they are marked WON. Status is never changed here.
pub fn link_manually<S>(store: &S, lead_id: Uuid, business_id: Uuid) -> LeadResult<Lead>
where
    S: LeadStore + BusinessDirectory + ?Sized,
{
    let mut lead = store
        .get_lead(lead_id)?
        .ok_or_else(|| LeadError::lead_not_found(lead_id))?;
    let business = store.get_business(business_id)?.ok_or(LeadError::NotFound {
        entity: "business",
        id: business_id,
    })?;

    let now = Utc::now();
    let before = lead.clone();
    if lead.status == LeadStatus::Won {
        apply_link(&mut lead, &business, now);
    } else {
        lead.pending_conversion_id = Some(business.id);
    }

    if lead == before {
        return Ok(lead);
    }
    lead.version += 1;
    lead.updated_at = now;
    commit_lead(store, &lead, before.version, &[])?;
    tracing::info!(
        lead_id = %lead.id,
        business_id = %business.id,
        pending = lead.status != LeadStatus::Won,
        "linked lead to business"
    );
    Ok(lead)
}

/// Drop any link or pending link. Status is left alone.
pub fn unlink<S: LeadStore + ?Sized>(store: &S, lead_id: Uuid) -> LeadResult<Lead> {
    let mut lead = store
        .get_lead(lead_id)?
        .ok_or_else(|| LeadError::lead_not_found(lead_id))?;

    if lead.converted_to_id.is_none() && lead.pending_conversion_id.is_none() {
        return Ok(lead);
    }

    let prior_version = lead.version;
    lead.clear_conversion();
    lead.pending_conversion_id = None;
    lead.version += 1;
    lead.updated_at = Utc::now();
    commit_lead(store, &lead, prior_version, &[])?;
    tracing::info!(lead_id = %lead.id, "unlinked lead");
    Ok(lead)
}
