use crate::data::Bar;
use crate::engine::trailing::TrailingStop;
use crate::portfolio::{Account, TradeRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub type OrderId = u64;

//order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    //converts to quantity sign (Buy = +1, Sell = -1)
    pub fn to_qty_sign(&self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }
}

//how many shares an order moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantity {
    Shares(u64),
    //whatever is held when the order executes
    Position,
}

//order type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit(f64),
    Stop(f64),
    //sell-side stop trailing the highest close since entry
    TrailingStop(TrailingStop),
}

//what a strategy asks for on a bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: OrderSide,
    pub qty: Quantity,
    pub order_type: OrderType,
    //child orders stay dormant until the parent fills
    pub parent: Option<OrderId>,
}

impl OrderIntent {
    pub fn buy(qty: u64) -> Self {
        OrderIntent {
            side: OrderSide::Buy,
            qty: Quantity::Shares(qty),
            order_type: OrderType::Market,
            parent: None,
        }
    }

    pub fn sell(qty: u64) -> Self {
        OrderIntent {
            side: OrderSide::Sell,
            qty: Quantity::Shares(qty),
            order_type: OrderType::Market,
            parent: None,
        }
    }

    //market sell of the whole position
    pub fn close() -> Self {
        OrderIntent {
            side: OrderSide::Sell,
            qty: Quantity::Position,
            order_type: OrderType::Market,
            parent: None,
        }
    }

    pub fn limit(side: OrderSide, qty: u64, price: f64) -> Self {
        OrderIntent {
            side,
            qty: Quantity::Shares(qty),
            order_type: OrderType::Limit(price),
            parent: None,
        }
    }

    pub fn stop(side: OrderSide, qty: u64, price: f64) -> Self {
        OrderIntent {
            side,
            qty: Quantity::Shares(qty),
            order_type: OrderType::Stop(price),
            parent: None,
        }
    }

    //protective sell of the whole position, `percent` below the running peak
    pub fn trailing_stop(percent: f64) -> Self {
        OrderIntent {
            side: OrderSide::Sell,
            qty: Quantity::Position,
            order_type: OrderType::TrailingStop(TrailingStop::new(percent)),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: OrderId) -> Self {
        self.parent = Some(parent);
        self
    }
}

//represents a submitted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub submitted: NaiveDate,
    pub side: OrderSide,
    pub qty: Quantity,
    pub order_type: OrderType,
    pub parent: Option<OrderId>,
}

impl Order {
    pub fn from_intent(id: OrderId, submitted: NaiveDate, intent: OrderIntent) -> Self {
        Order {
            id,
            submitted,
            side: intent.side,
            qty: intent.qty,
            order_type: intent.order_type,
            parent: intent.parent,
        }
    }

    //exit orders sized by the position at execution time
    pub fn closes_position(&self) -> bool {
        self.side == OrderSide::Sell && self.qty == Quantity::Position
    }
}

//represents a filled order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub id: u64,
    pub order_id: OrderId,
    pub date: NaiveDate,
    pub side: OrderSide,
    pub qty: i64, //signed: positive for buys, negative for sells
    pub fill_price: f64,
    pub commission: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Completed,
    Canceled,
    Margin,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    ZeroQuantity,
    //long-only: sells may not exceed the held shares
    InsufficientPosition { requested: u64, held: i64 },
}

//terminal outcome of an order, delivered in the report of the bar it happened on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderEvent {
    Filled(Fill),
    Canceled {
        order_id: OrderId,
        side: OrderSide,
    },
    //cash did not cover the purchase
    Margin {
        order_id: OrderId,
        side: OrderSide,
        required: f64,
        available: f64,
    },
    Rejected {
        order_id: OrderId,
        side: OrderSide,
        reason: RejectReason,
    },
}

impl OrderEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::Filled(fill) => fill.order_id,
            OrderEvent::Canceled { order_id, .. }
            | OrderEvent::Margin { order_id, .. }
            | OrderEvent::Rejected { order_id, .. } => *order_id,
        }
    }

    pub fn side(&self) -> OrderSide {
        match self {
            OrderEvent::Filled(fill) => fill.side,
            OrderEvent::Canceled { side, .. }
            | OrderEvent::Margin { side, .. }
            | OrderEvent::Rejected { side, .. } => *side,
        }
    }

    pub fn status(&self) -> OrderStatus {
        match self {
            OrderEvent::Filled(_) => OrderStatus::Completed,
            OrderEvent::Canceled { .. } => OrderStatus::Canceled,
            OrderEvent::Margin { .. } => OrderStatus::Margin,
            OrderEvent::Rejected { .. } => OrderStatus::Rejected,
        }
    }
}

//everything the execution engine resolved on one bar
#[derive(Debug, Clone, PartialEq)]
pub struct BarReport {
    pub date: NaiveDate,
    pub events: Vec<OrderEvent>,
    pub closed_trades: Vec<TradeRecord>,
}

impl BarReport {
    pub fn new(date: NaiveDate) -> Self {
        BarReport {
            date,
            events: Vec::new(),
            closed_trades: Vec::new(),
        }
    }

    pub fn fills(&self) -> impl Iterator<Item = &Fill> {
        self.events.iter().filter_map(|e| match e {
            OrderEvent::Filled(fill) => Some(fill),
            _ => None,
        })
    }

    //the terminal event of an order on this bar, if any
    pub fn event_for(&self, order_id: OrderId) -> Option<&OrderEvent> {
        self.events.iter().find(|e| e.order_id() == order_id)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.closed_trades.is_empty()
    }
}

//commission and slippage as fractions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

impl CostModel {
    //moves the price against the trader
    pub fn slipped(&self, side: OrderSide, price: f64) -> f64 {
        price * (1.0 + self.slippage_rate * side.to_qty_sign() as f64)
    }

    pub fn commission(&self, qty: u64, price: f64) -> f64 {
        qty as f64 * price * self.commission_rate
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Resolution {
    Filled(f64),
    Failed,
}

//simulates order execution against daily bars
//orders submitted on a bar are first evaluated on the following bar
pub struct ExecutionEngine {
    next_order_id: u64,
    next_fill_id: u64,
    pending_orders: Vec<Order>,
    resolved: HashMap<OrderId, Resolution>,
    queued_events: Vec<OrderEvent>,
    costs: CostModel,
}

impl ExecutionEngine {
    pub fn new(costs: CostModel) -> Self {
        ExecutionEngine {
            next_order_id: 1,
            next_fill_id: 1,
            pending_orders: Vec::new(),
            resolved: HashMap::new(),
            queued_events: Vec::new(),
            costs,
        }
    }

    //submits an order and returns its ID
    pub fn submit(&mut self, submitted: NaiveDate, intent: OrderIntent) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        self.pending_orders
            .push(Order::from_intent(id, submitted, intent));
        id
    }

    //cancels a pending order; the Canceled event arrives with the next bar report
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        let Some(idx) = self.pending_orders.iter().position(|o| o.id == order_id) else {
            return false;
        };
        let order = self.pending_orders.remove(idx);
        self.resolved.insert(order.id, Resolution::Failed);
        self.queued_events.push(OrderEvent::Canceled {
            order_id: order.id,
            side: order.side,
        });
        true
    }

    //returns the number of pending orders
    pub fn pending_order_count(&self) -> usize {
        self.pending_orders.len()
    }

    pub fn pending_orders(&self) -> &[Order] {
        &self.pending_orders
    }

    pub fn is_pending(&self, order_id: OrderId) -> bool {
        self.pending_orders.iter().any(|o| o.id == order_id)
    }

    //trigger check; returns the raw execution price when the order executes on `bar`
    //trailing stops that stay untouched ratchet on the close
    fn trigger_price(order: &mut Order, bar: &Bar, entry_price: Option<f64>) -> Option<f64> {
        match &mut order.order_type {
            OrderType::Market => Some(bar.open),
            OrderType::Limit(limit) => match order.side {
                OrderSide::Buy => (bar.low <= *limit).then(|| bar.open.min(*limit)),
                OrderSide::Sell => (bar.high >= *limit).then(|| bar.open.max(*limit)),
            },
            OrderType::Stop(stop) => match order.side {
                OrderSide::Buy => (bar.high >= *stop).then(|| bar.open.max(*stop)),
                OrderSide::Sell => (bar.low <= *stop).then(|| bar.open.min(*stop)),
            },
            OrderType::TrailingStop(trail) => {
                if !trail.is_armed() {
                    match entry_price {
                        //armed on the entry bar: tracking starts, triggering waits a bar
                        Some(price) => {
                            trail.rebase(price);
                            trail.observe(bar.close);
                            return None;
                        }
                        None => trail.rebase(bar.open),
                    }
                }

                if trail.is_hit(bar.open) {
                    Some(bar.open)
                } else if trail.is_hit(bar.low) {
                    trail.stop_price()
                } else {
                    trail.observe(bar.close);
                    None
                }
            }
        }
    }

    //processes pending orders against the bar, settling fills into the account
    pub fn process_bar(&mut self, bar: &Bar, account: &mut Account) -> BarReport {
        let mut report = BarReport::new(bar.date);
        report.events.append(&mut self.queued_events);

        let orders = std::mem::take(&mut self.pending_orders);
        let mut orders_to_keep: Vec<Order> = Vec::with_capacity(orders.len());

        for mut order in orders {
            //child orders wait for the parent's fill
            let entry_price = match order.parent.map(|p| self.resolved.get(&p).copied()) {
                None => None,
                Some(Some(Resolution::Filled(price))) => Some(price),
                Some(None) if orders_to_keep.iter().any(|o| Some(o.id) == order.parent) => {
                    orders_to_keep.push(order);
                    continue;
                }
                //parent failed, or left the book before this child was submitted
                Some(_) => {
                    self.resolved.insert(order.id, Resolution::Failed);
                    report.events.push(OrderEvent::Canceled {
                        order_id: order.id,
                        side: order.side,
                    });
                    continue;
                }
            };

            let raw_price = match Self::trigger_price(&mut order, bar, entry_price) {
                Some(price) => price,
                None => {
                    orders_to_keep.push(order);
                    continue;
                }
            };

            let event = self.execute(&order, bar.date, raw_price, account, &mut report);
            debug!(date = %bar.date, order_id = order.id, status = ?event.status(), "order resolved");
            report.events.push(event);
        }

        //nothing left to protect: resting exit orders are dropped
        if account.position.is_flat() {
            let (stale, live): (Vec<Order>, Vec<Order>) =
                orders_to_keep.into_iter().partition(|o| {
                    o.closes_position()
                        && o.parent.map_or(true, |p| {
                            matches!(self.resolved.get(&p), Some(Resolution::Filled(_)))
                        })
                });
            for order in stale {
                self.resolved.insert(order.id, Resolution::Failed);
                report.events.push(OrderEvent::Canceled {
                    order_id: order.id,
                    side: order.side,
                });
            }
            orders_to_keep = live;
        }

        self.pending_orders = orders_to_keep;

        //a resolution is only kept while a resting child still waits on it
        let parents: HashSet<OrderId> =
            self.pending_orders.iter().filter_map(|o| o.parent).collect();
        self.resolved.retain(|id, _| parents.contains(id));

        report
    }

    fn execute(
        &mut self,
        order: &Order,
        date: NaiveDate,
        raw_price: f64,
        account: &mut Account,
        report: &mut BarReport,
    ) -> OrderEvent {
        let held = account.position.net_qty;
        let qty = match order.qty {
            Quantity::Shares(n) => n,
            Quantity::Position => held.max(0) as u64,
        };

        if qty == 0 {
            self.resolved.insert(order.id, Resolution::Failed);
            return match order.qty {
                Quantity::Position => OrderEvent::Canceled {
                    order_id: order.id,
                    side: order.side,
                },
                Quantity::Shares(_) => OrderEvent::Rejected {
                    order_id: order.id,
                    side: order.side,
                    reason: RejectReason::ZeroQuantity,
                },
            };
        }

        let price = self.costs.slipped(order.side, raw_price);
        let commission = self.costs.commission(qty, price);

        match order.side {
            OrderSide::Buy => {
                let required = qty as f64 * price + commission;
                if !account.can_afford(required) {
                    self.resolved.insert(order.id, Resolution::Failed);
                    return OrderEvent::Margin {
                        order_id: order.id,
                        side: order.side,
                        required,
                        available: account.cash,
                    };
                }
            }
            OrderSide::Sell => {
                if qty as i64 > held {
                    self.resolved.insert(order.id, Resolution::Failed);
                    return OrderEvent::Rejected {
                        order_id: order.id,
                        side: order.side,
                        reason: RejectReason::InsufficientPosition {
                            requested: qty,
                            held,
                        },
                    };
                }
            }
        }

        let fill = Fill {
            id: self.next_fill_id,
            order_id: order.id,
            date,
            side: order.side,
            qty: qty as i64 * order.side.to_qty_sign(),
            fill_price: price,
            commission,
        };
        self.next_fill_id += 1;
        self.resolved.insert(order.id, Resolution::Filled(price));

        if let Some(trade) = account.process_fill(fill.clone()) {
            report.closed_trades.push(trade);
        }

        OrderEvent::Filled(fill)
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(CostModel::default())
    }
}
