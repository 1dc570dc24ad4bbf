//! Call record managers
//!
//! - Per-kind managers (`individual`, `group`, `ad_hoc`): create-or-update
//!   orchestration, status merging and announcements
//! - `delete`: record removal paired with tombstones
//! - `missed`: unread counts and bulk read marking
//! - `ring_update`: group ring signals mapped onto group statuses

mod ad_hoc;
mod delete;
mod group;
mod individual;
mod missed;
mod ring_update;

pub use ad_hoc::AdHocCallRecordManager;
pub use delete::CallRecordDeleteManager;
pub use group::{GroupCall, GroupCallRecordManager, GroupCallUpdate};
pub use individual::{IndividualCall, IndividualCallRecordManager};
pub use missed::MissedCallManager;
pub use ring_update::{GroupRingUpdate, RingUpdate, RingUpdateHandler};

use std::sync::Arc;
use tracing::{info, warn};

use crate::collaborators::{CallEntry, Collaborators, TimelineEntryOwner};
use crate::db::DbWriteTx;
use crate::error::Result;
use crate::model::{
    Aci, CallDirection, CallRecord, CallStatus, CallType, ConversationId, NewCallRecord,
};
use crate::policy::{CallStatusPolicy, TransitionOutcome};
use crate::store::{CallRecordFetch, CallRecordStore};
use crate::sync::OutgoingSyncMessageComposer;

/// What a create-or-update call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Created(CallRecord),
    Updated(CallRecord),
    /// The record exists and the requested status was rejected.
    Unchanged(CallRecord),
    /// The call was deleted earlier; nothing was written.
    Tombstoned,
}

impl RecordOutcome {
    pub fn record(&self) -> Option<&CallRecord> {
        match self {
            RecordOutcome::Created(r) | RecordOutcome::Updated(r) | RecordOutcome::Unchanged(r) => {
                Some(r)
            }
            RecordOutcome::Tombstoned => None,
        }
    }
}

/// A call as observed by some source, before it is merged into storage.
#[derive(Debug, Clone)]
pub(crate) struct CallObservation {
    pub call_id: u64,
    pub conversation_id: ConversationId,
    pub call_type: CallType,
    pub direction: CallDirection,
    pub status: CallStatus,
    pub ringer: Option<Aci>,
    pub timestamp: u64,
}

/// Requested change to an existing record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordChange {
    pub direction: Option<CallDirection>,
    pub status: CallStatus,
    pub ringer: Option<Aci>,
    pub timestamp: u64,
}

/// Create-or-update machinery shared by the per-kind managers.
pub(crate) struct RecordWriter {
    store: CallRecordStore,
    policy: CallStatusPolicy,
    timeline: Arc<dyn TimelineEntryOwner>,
    composer: OutgoingSyncMessageComposer,
}

impl RecordWriter {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            store: CallRecordStore::new(),
            policy: CallStatusPolicy::new(),
            timeline: collaborators.timeline.clone(),
            composer: OutgoingSyncMessageComposer::new(collaborators),
        }
    }

    pub fn create_or_update(
        &self,
        observation: CallObservation,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<RecordOutcome> {
        match self
            .store
            .fetch(observation.call_id, observation.conversation_id, tx)?
        {
            CallRecordFetch::Tombstoned => {
                warn!(
                    call_id = observation.call_id,
                    conversation = %observation.conversation_id,
                    "ignoring call update, record was deleted"
                );
                Ok(RecordOutcome::Tombstoned)
            }
            CallRecordFetch::NotFound => self.create(observation, announce, tx),
            CallRecordFetch::Found(record) => {
                let change = RecordChange {
                    direction: Some(observation.direction),
                    status: observation.status,
                    ringer: observation.ringer,
                    timestamp: observation.timestamp,
                };
                self.update(record, change, announce, tx)
            }
        }
    }

    pub fn create(
        &self,
        observation: CallObservation,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<RecordOutcome> {
        let interaction_row_id = self.timeline.insert_call_entry(
            &CallEntry {
                conversation_id: observation.conversation_id,
                call_type: observation.call_type,
                call_direction: observation.direction,
                call_status: observation.status,
                timestamp: observation.timestamp,
            },
            tx,
        )?;

        let ringer = observation
            .ringer
            .filter(|_| is_ringing_family(observation.status));
        let record = self.store.insert(
            NewCallRecord {
                call_id: observation.call_id,
                conversation_id: observation.conversation_id,
                interaction_row_id,
                call_type: observation.call_type,
                call_direction: observation.direction,
                call_status: observation.status,
                call_began_timestamp: observation.timestamp,
                group_call_ringer_aci: ringer,
            },
            tx,
        )?;

        if announce {
            self.composer.send_status_event(&record, tx)?;
        }
        Ok(RecordOutcome::Created(record))
    }

    pub fn update(
        &self,
        mut record: CallRecord,
        change: RecordChange,
        announce: bool,
        tx: &DbWriteTx<'_>,
    ) -> Result<RecordOutcome> {
        let status = match self.policy.transition(record.call_status, change.status) {
            TransitionOutcome::Allowed => change.status,
            TransitionOutcome::PreferAlternate(alternate) => {
                info!(
                    call_id = record.call_id,
                    requested = %change.status,
                    preferred = %alternate,
                    "preferring alternate status"
                );
                alternate
            }
            TransitionOutcome::NotAllowed => {
                warn!(
                    call_id = record.call_id,
                    from = %record.call_status,
                    to = %change.status,
                    "status transition not allowed"
                );
                return Ok(RecordOutcome::Unchanged(record));
            }
        };

        if let Some(direction) = change.direction {
            if direction != record.call_direction {
                self.store.update_direction(&mut record, direction, tx)?;
            }
        }
        self.store
            .update_call_began_timestamp_if_earlier(&mut record, change.timestamp, tx)?;
        self.store.update_call_status(&mut record, status, tx)?;
        self.timeline.update_call_entry(
            record.interaction_row_id,
            record.call_direction,
            status,
            tx,
        )?;

        if let Some(ringer) = change.ringer {
            if is_ringing_family(status) {
                self.store
                    .update_group_call_ringer_aci(&mut record, ringer, tx)?;
            }
        }

        info!(
            call_id = record.call_id,
            conversation = %record.conversation_id,
            status = %status,
            "updated call record"
        );

        if announce {
            self.composer.send_status_event(&record, tx)?;
        }
        Ok(RecordOutcome::Updated(record))
    }
}

fn is_ringing_family(status: CallStatus) -> bool {
    status.as_group().is_some_and(|s| s.is_ringing_family())
}
