//! # Invoice Pricing Calculator
//!
//! One pricing routine for every invoice flow. The original system had three
//! separate invoice-generation pages, each reimplementing this math slightly
//! differently (one applied per-item discounts, the others did not). Here
//! both flows call [`price_invoice`]; the full-invoice flow simply passes
//! zero per-item discounts.
//!
//! ## The Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Pricing Pipeline                                   │
//! │                                                                         │
//! │  per line:                                                              │
//! │    unit_price      = unit_cost × (1 + markup)                           │
//! │    line_subtotal   = unit_price × quantity, then − item discount        │
//! │                                                                         │
//! │  invoice:                                                               │
//! │    subtotal_before = Σ line_subtotal                                    │
//! │    discount_amount = subtotal_before × overall_discount                 │
//! │    subtotal_after  = subtotal_before − discount_amount                  │
//! │    vat_amount      = subtotal_after × vat_rate                          │
//! │    total_amount    = subtotal_after + vat_amount                        │
//! │    profit          = total_amount − Σ (unit_cost × quantity)            │
//! │                                                                         │
//! │  back onto lines:                                                       │
//! │    each line gets a proportional share of the overall discount and      │
//! │    of the VAT; the rounding residual lands on the LAST line, so         │
//! │    Σ line totals == total_amount EXACTLY, by construction.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Markup defaults come from [`BillingSettings`] per item type (labor 0%,
//! parts 20%, subcontract 15% out of the box) and are resolved here, once,
//! rather than being read from a settings table mid-calculation.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BillingItemType, BillingSettings, Rate};

// =============================================================================
// Input
// =============================================================================

/// One eligible item handed to the calculator.
///
/// Produced by the eligibility resolver; `reference_id` points at the source
/// row (labor charge, supplier invoice item, or subcontract work) and flows
/// through unchanged into the invoice item's double-billing guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillableLine {
    /// The job this item belongs to. For vehicle-wide invoices the writer
    /// uses this to know which jobs the final invoice closes.
    pub job_id: String,
    pub item_type: BillingItemType,
    pub reference_id: String,
    pub description: String,

    /// What the shop paid per unit.
    pub unit_cost: Money,
    pub quantity: i64,

    /// Markup override. None means "use the settings default for this
    /// item type".
    pub markup: Option<Rate>,

    /// Per-item discount. The single-job flow may set this; the vehicle-wide
    /// full-invoice flow always passes zero.
    pub item_discount: Rate,
}

impl BillableLine {
    /// A line with default markup and no per-item discount.
    pub fn new(
        job_id: impl Into<String>,
        item_type: BillingItemType,
        reference_id: impl Into<String>,
        description: impl Into<String>,
        unit_cost: Money,
        quantity: i64,
    ) -> Self {
        BillableLine {
            job_id: job_id.into(),
            item_type,
            reference_id: reference_id.into(),
            description: description.into(),
            unit_cost,
            quantity,
            markup: None,
            item_discount: Rate::zero(),
        }
    }

    /// Sets an explicit markup, overriding the settings default.
    pub fn with_markup(mut self, markup: Rate) -> Self {
        self.markup = Some(markup);
        self
    }

    /// Sets a per-item discount.
    pub fn with_item_discount(mut self, discount: Rate) -> Self {
        self.item_discount = discount;
        self
    }
}

// =============================================================================
// Output
// =============================================================================

/// A fully priced invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub job_id: String,
    pub item_type: BillingItemType,
    pub reference_id: String,
    pub description: String,
    pub quantity: i64,

    pub unit_cost: Money,
    pub markup: Rate,
    pub unit_price: Money,
    pub item_discount: Rate,

    /// Line subtotal after the per-item discount, before the overall
    /// discount share.
    pub line_subtotal: Money,
    /// This line's share of the overall invoice discount.
    pub discount_share: Money,
    pub vat: Money,
    pub total: Money,
}

/// A fully priced invoice, ready for the writer to persist.
///
/// Invariants (enforced by construction, asserted in tests):
/// - `total_amount == subtotal_after_discount + vat_amount`
/// - `subtotal_after_discount == subtotal_before_discount - overall_discount_amount`
/// - `Σ line.total == total_amount` exactly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedInvoice {
    pub lines: Vec<PricedLine>,

    pub subtotal_before_discount: Money,
    pub overall_discount: Rate,
    pub overall_discount_amount: Money,
    pub subtotal_after_discount: Money,
    pub vat_rate: Rate,
    pub vat_amount: Money,
    pub total_amount: Money,

    pub total_cost: Money,
    pub profit: Money,
}

impl PricedInvoice {
    /// Profit as a percentage of the invoice total, 0 when the total is 0.
    pub fn profit_pct(&self) -> f64 {
        if self.total_amount.is_positive() {
            self.profit.cents() as f64 / self.total_amount.cents() as f64 * 100.0
        } else {
            0.0
        }
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Prices a set of eligible lines into a complete invoice.
///
/// ## Arguments
/// * `lines` - eligible items from the resolver; must be non-empty
/// * `overall_discount` - invoice-wide discount applied after line subtotals
/// * `settings` - company billing settings (VAT rate, default markups)
///
/// ## Errors
/// [`CoreError::EmptyInvoice`] when `lines` is empty.
pub fn price_invoice(
    lines: &[BillableLine],
    overall_discount: Rate,
    settings: &BillingSettings,
) -> CoreResult<PricedInvoice> {
    if lines.is_empty() {
        return Err(CoreError::EmptyInvoice);
    }

    // Pass 1: per-line price and post-item-discount subtotal.
    let mut priced: Vec<PricedLine> = Vec::with_capacity(lines.len());
    let mut subtotal_before = Money::zero();
    let mut total_cost = Money::zero();

    for line in lines {
        let markup = line
            .markup
            .unwrap_or_else(|| settings.default_markup_for(line.item_type));
        let unit_price = line.unit_cost.apply_markup(markup);
        let gross = unit_price.times(line.quantity);
        let line_subtotal = gross.apply_discount(line.item_discount);

        subtotal_before += line_subtotal;
        total_cost += line.unit_cost.times(line.quantity);

        priced.push(PricedLine {
            job_id: line.job_id.clone(),
            item_type: line.item_type,
            reference_id: line.reference_id.clone(),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_cost: line.unit_cost,
            markup,
            unit_price,
            item_discount: line.item_discount,
            line_subtotal,
            // Filled in by pass 2.
            discount_share: Money::zero(),
            vat: Money::zero(),
            total: Money::zero(),
        });
    }

    // Invoice aggregates.
    let overall_discount_amount = subtotal_before.discount_amount(overall_discount);
    let subtotal_after = subtotal_before - overall_discount_amount;
    let vat_amount = subtotal_after.vat_amount(settings.vat);
    let total_amount = subtotal_after + vat_amount;
    let profit = total_amount - total_cost;

    // Pass 2: allocate the overall discount and VAT back onto lines
    // proportionally. Every line except the last gets a floored
    // proportional share; the last line absorbs the residual, so the line
    // columns sum to the invoice aggregates exactly. Flooring keeps the
    // residual non-negative: the floored shares never overshoot the
    // aggregate, so no line ever shows a negative discount or VAT.
    let line_count = priced.len();
    let mut discount_allocated = Money::zero();
    let mut vat_allocated = Money::zero();

    for (idx, line) in priced.iter_mut().enumerate() {
        let is_last = idx == line_count - 1;

        let share = if is_last {
            overall_discount_amount - discount_allocated
        } else if subtotal_before.is_zero() {
            Money::zero()
        } else {
            // floor(discount × line_subtotal / subtotal_before)
            let cents = overall_discount_amount.cents() as i128
                * line.line_subtotal.cents() as i128
                / subtotal_before.cents() as i128;
            Money::from_cents(cents as i64)
        };
        discount_allocated += share;

        let after_share = line.line_subtotal - share;
        let vat = if is_last {
            vat_amount - vat_allocated
        } else if subtotal_after.is_zero() {
            Money::zero()
        } else {
            // floor(vat × after_share / subtotal_after)
            let cents = vat_amount.cents() as i128 * after_share.cents() as i128
                / subtotal_after.cents() as i128;
            Money::from_cents(cents as i64)
        };
        vat_allocated += vat;

        line.discount_share = share;
        line.vat = vat;
        line.total = after_share + vat;
    }

    Ok(PricedInvoice {
        lines: priced,
        subtotal_before_discount: subtotal_before,
        overall_discount,
        overall_discount_amount,
        subtotal_after_discount: subtotal_after,
        vat_rate: settings.vat,
        vat_amount,
        total_amount,
        total_cost,
        profit,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
