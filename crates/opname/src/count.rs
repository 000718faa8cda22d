use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{LedgerError, LedgerResult, OpnameId, ProductId};

/// Stock-count lifecycle. Terminal states accept no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpnameStatus {
    Draft,
    Approved,
    Rejected,
}

/// Why a counted quantity differs from the ledger's belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    Broken,
    Lost,
    Expired,
    ManualInput,
    /// Count agreed with the ledger (delta 0).
    Match,
}

impl fmt::Display for AdjustmentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdjustmentReason::Broken => "broken",
            AdjustmentReason::Lost => "lost",
            AdjustmentReason::Expired => "expired",
            AdjustmentReason::ManualInput => "manual_input",
            AdjustmentReason::Match => "match",
        };
        f.write_str(s)
    }
}

impl FromStr for AdjustmentReason {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broken" => Ok(AdjustmentReason::Broken),
            "lost" => Ok(AdjustmentReason::Lost),
            "expired" => Ok(AdjustmentReason::Expired),
            "manual_input" => Ok(AdjustmentReason::ManualInput),
            "match" => Ok(AdjustmentReason::Match),
            other => Err(LedgerError::validation(format!(
                "unknown adjustment reason: {other}"
            ))),
        }
    }
}

/// One counted product within a stock-count event.
///
/// `system_qty` is the ledger's belief captured at submission time; the delta
/// stays informational until the parent event is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpnameItem {
    pub product_id: ProductId,
    pub system_qty: i64,
    pub actual_qty: i64,
    pub reason: AdjustmentReason,
    /// Opaque reference to photographic evidence, when the counter took any.
    pub evidence_ref: Option<String>,
}

impl OpnameItem {
    pub fn new(
        product_id: ProductId,
        system_qty: i64,
        actual_qty: i64,
        reason: AdjustmentReason,
        evidence_ref: Option<String>,
    ) -> LedgerResult<Self> {
        if actual_qty < 0 {
            return Err(LedgerError::InvalidQuantity(actual_qty));
        }
        Ok(Self {
            product_id,
            system_qty,
            actual_qty,
            reason,
            evidence_ref,
        })
    }

    /// Positive when stock was found, negative on shrinkage.
    pub fn delta(&self) -> i64 {
        self.actual_qty - self.system_qty
    }
}

/// Ledger mutation approval performs for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountAdjustment {
    pub product_id: ProductId,
    pub delta: i64,
}

/// A physical stock-count event.
///
/// Opened as a draft, filled with one item per product, then approved (deltas
/// hit the ledger exactly once) or rejected (no ledger effect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpnameEvent {
    pub id: OpnameId,
    /// Sequential document number, e.g. "SO-00003".
    pub number: String,
    /// Count instant; the anchor timestamp once approved.
    pub recorded_at: DateTime<Utc>,
    pub status: OpnameStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub items: Vec<OpnameItem>,
    /// Store-assigned insertion sequence; tie-break for equal timestamps.
    pub seq: u64,
}

impl OpnameEvent {
    pub fn draft(
        id: OpnameId,
        number: impl Into<String>,
        recorded_at: DateTime<Utc>,
        seq: u64,
    ) -> LedgerResult<Self> {
        let number = number.into();
        if number.trim().is_empty() {
            return Err(LedgerError::validation("document number cannot be empty"));
        }
        Ok(Self {
            id,
            number,
            recorded_at,
            status: OpnameStatus::Draft,
            approved_at: None,
            items: Vec::new(),
            seq,
        })
    }

    pub fn is_draft(&self) -> bool {
        self.status == OpnameStatus::Draft
    }

    pub fn is_approved(&self) -> bool {
        self.status == OpnameStatus::Approved
    }

    pub fn item_for(&self, product_id: ProductId) -> Option<&OpnameItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Add a counted product to a draft. Each product may appear once per
    /// event: the second count of the same shelf supersedes nothing, it is a
    /// different event.
    pub fn push_item(&mut self, item: OpnameItem) -> LedgerResult<()> {
        if !self.is_draft() {
            return Err(LedgerError::invariant(format!(
                "count {} is {} and accepts no more items",
                self.number, self.status_name()
            )));
        }
        if self.item_for(item.product_id).is_some() {
            return Err(LedgerError::validation(format!(
                "product {} already counted in {}",
                item.product_id, self.number
            )));
        }
        self.items.push(item);
        Ok(())
    }

    /// The mutations approval applies, in ascending product-id order so
    /// overlapping approvals lock products in a fixed order.
    pub fn adjustments(&self) -> Vec<CountAdjustment> {
        let mut adjustments: Vec<CountAdjustment> = self
            .items
            .iter()
            .map(|item| CountAdjustment {
                product_id: item.product_id,
                delta: item.delta(),
            })
            .collect();
        adjustments.sort_by_key(|a| a.product_id);
        adjustments
    }

    /// `draft -> approved`. Returns `true` when the caller must apply the
    /// deltas, `false` when the event was already approved (idempotent
    /// re-approval must not touch the ledger again).
    pub fn mark_approved(&mut self, at: DateTime<Utc>) -> LedgerResult<bool> {
        match self.status {
            OpnameStatus::Approved => Ok(false),
            OpnameStatus::Rejected => Err(LedgerError::invariant(format!(
                "rejected count {} cannot be approved",
                self.number
            ))),
            OpnameStatus::Draft => {
                if self.items.is_empty() {
                    return Err(LedgerError::EmptyCount);
                }
                self.status = OpnameStatus::Approved;
                self.approved_at = Some(at);
                Ok(true)
            }
        }
    }

    /// `draft -> rejected`. Rejecting twice is a no-op; an approved event can
    /// no longer be rejected (its deltas are in the ledger).
    pub fn mark_rejected(&mut self) -> LedgerResult<()> {
        match self.status {
            OpnameStatus::Rejected => Ok(()),
            OpnameStatus::Approved => Err(LedgerError::invariant(format!(
                "approved count {} cannot be rejected",
                self.number
            ))),
            OpnameStatus::Draft => {
                self.status = OpnameStatus::Rejected;
                Ok(())
            }
        }
    }

    fn status_name(&self) -> &'static str {
        match self.status {
            OpnameStatus::Draft => "draft",
            OpnameStatus::Approved => "approved",
            OpnameStatus::Rejected => "rejected",
        }
    }
}
