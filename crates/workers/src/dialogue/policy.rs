// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The "when to stop asking for metadata" predicate and related sufficiency
//! checks.

use nwb_core::{schema, MetadataPolicy, Session};

/// Required fields not yet present in `user_metadata`.
pub fn missing_required_fields(session: &Session) -> Vec<&'static str> {
    schema::required_fields().filter(|f| !session.user_metadata.contains_key(*f)).collect()
}

/// True iff another metadata request should be sent: there are missing
/// required fields AND the policy hasn't already settled the matter
/// (declined, proceeding minimal, or already asked once this session).
///
/// `active_processing`/"user has not already responded this round" are not
/// re-checked here: this predicate is only ever evaluated by the dialogue
/// worker immediately after the triggering LLM call has already completed
/// and the current message has already been applied, so both conditions
/// hold trivially at every call site.
pub fn should_request_metadata(session: &Session) -> bool {
    !missing_required_fields(session).is_empty()
        && !matches!(
            session.metadata_policy,
            MetadataPolicy::UserDeclined | MetadataPolicy::ProceedingMinimal | MetadataPolicy::AskedOnce
        )
}

/// True iff the dialogue may proceed to conversion: either metadata is
/// sufficient, or the policy has settled on proceeding with what's available
/// (declined, already asked and responded, or explicitly minimal).
pub fn is_ready_to_proceed(session: &Session) -> bool {
    missing_required_fields(session).is_empty() || !should_request_metadata(session)
}
