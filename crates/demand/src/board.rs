//! Per-product shortage aggregation.
//!
//! Mostly a read, with one deliberate exception: reading the board first
//! repairs allocation records whose purchase order was cancelled out from
//! under them, so the on-order column never counts dead commitments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use controltower_allocation::AllocationLedger;
use controltower_core::{Entity, Qty};
use controltower_orders::{OrderBook, PurchaseOrderId, SaleLineId};
use controltower_parties::PartyId;
use controltower_products::ProductId;
use controltower_stock::StockIndex;

/// One outstanding demand line behind a board row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandDetail {
    pub sale_line_id: SaleLineId,
    pub partner_id: PartyId,
    pub order_reference: String,
    pub outstanding: Qty,
    /// The open commitment covering this line, when one exists.
    pub commitment: Option<PurchaseOrderId>,
}

/// Shortage summary for one product with outstanding procurable demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandRow {
    pub product_id: ProductId,
    pub demanded: Qty,
    /// Physical stock in internal locations.
    pub available: Qty,
    /// Physical stock in transit holding areas.
    pub in_transit: Qty,
    /// Ordered minus received over open commitment lines.
    pub on_order: Qty,
    /// `max(0, demanded - (available + in_transit + on_order))`.
    pub to_buy: Qty,
    pub details: Vec<DemandDetail>,
}

/// Build the board over every product with outstanding demand flagged for
/// procurement, in first-seen order.
pub fn overview(
    book: &OrderBook,
    ledger: &mut AllocationLedger,
    stock: &StockIndex,
) -> Vec<DemandRow> {
    ledger.heal_cancelled_commitments(book);

    let mut products: Vec<ProductId> = Vec::new();
    for line in book.sale_lines() {
        if line.send_for_procurement()
            && line.outstanding() > Decimal::ZERO
            && !products.contains(&line.product_id())
        {
            products.push(line.product_id());
        }
    }

    products
        .into_iter()
        .map(|product_id| {
            let mut demanded = Decimal::ZERO;
            let mut details = Vec::new();
            for line in book.sale_lines() {
                if line.product_id() != product_id
                    || !line.send_for_procurement()
                    || line.outstanding() <= Decimal::ZERO
                {
                    continue;
                }
                let Some(order) = book.sale_order(line.order_id()) else {
                    continue;
                };
                demanded += line.outstanding();
                let commitment = ledger
                    .records_for_sale_line(line.id())
                    .find(|r| r.is_open())
                    .and_then(|r| book.purchase_line(r.purchase_line_id()))
                    .map(|pl| pl.order_id());
                details.push(DemandDetail {
                    sale_line_id: line.id(),
                    partner_id: order.partner_id(),
                    order_reference: order.reference().to_owned(),
                    outstanding: line.outstanding(),
                    commitment,
                });
            }

            let available = stock.available_qty(product_id);
            let in_transit = stock.transit_qty(product_id);
            let on_order: Qty = book
                .purchase_lines()
                .filter(|l| l.product_id() == product_id)
                .filter(|l| {
                    book.purchase_order(l.order_id())
                        .is_some_and(|po| po.state().is_open())
                })
                .map(|l| l.outstanding())
                .fold(Decimal::ZERO, |acc, q| acc + q);

            let covered = available + in_transit + on_order;
            let to_buy = if demanded > covered {
                demanded - covered
            } else {
                Decimal::ZERO
            };
            DemandRow {
                product_id,
                demanded,
                available,
                in_transit,
                on_order,
                to_buy,
                details,
            }
        })
        .collect()
}
