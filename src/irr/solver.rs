use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use num_traits::ToPrimitive;

use crate::activities::Activity;
use crate::constants::DAYS_PER_YEAR;
use crate::errors::Result;
use crate::irr::irr_traits::IrrSolverTrait;
use crate::irr::IrrError;

/// One dated cash flow in a solver schedule, signed from the investor's
/// perspective (investments negative, withdrawals positive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Builds a solver schedule from a fund's (or fund set's) activities.
/// Activities are expected pre-filtered to the target date window and
/// sorted ascending; the terminal value is supplied separately.
pub fn build_schedule(activities: &[Activity]) -> Vec<CashFlow> {
    activities
        .iter()
        .map(|activity| CashFlow {
            date: activity.activity_date,
            amount: activity.signed_amount().to_f64().unwrap_or_default(),
        })
        .collect()
}

const MAX_ITERATIONS: usize = 200;
const RATE_LOWER_BOUND: f64 = -0.9999;
const RATE_UPPER_BOUND: f64 = 10.0;
const CONVERGENCE_EPSILON: f64 = 1e-10;

/// Annualized IRR solver over dated cash flows (XIRR), using bisection on
/// the net present value. Deliberately boring: robustness over speed.
#[derive(Debug, Default)]
pub struct XirrSolver;

impl XirrSolver {
    pub fn new() -> Self {
        Self
    }

    fn net_present_value(flows: &[CashFlow], anchor: NaiveDate, rate: f64) -> f64 {
        flows
            .iter()
            .map(|flow| {
                let years = (flow.date - anchor).num_days() as f64 / DAYS_PER_YEAR;
                flow.amount * (1.0 + rate).powf(-years)
            })
            .sum()
    }
}

#[async_trait]
impl IrrSolverTrait for XirrSolver {
    async fn solve(
        &self,
        schedule: &[CashFlow],
        terminal_value: f64,
        terminal_date: NaiveDate,
    ) -> Result<f64> {
        let mut flows: Vec<CashFlow> = schedule.to_vec();
        flows.push(CashFlow {
            date: terminal_date,
            amount: terminal_value,
        });

        if flows.len() < 2 {
            return Err(IrrError::Unsolvable(
                "Schedule needs at least one cash flow besides the terminal value".to_string(),
            )
            .into());
        }

        let has_outflow = flows.iter().any(|f| f.amount < 0.0);
        let has_inflow = flows.iter().any(|f| f.amount > 0.0);
        if !has_outflow || !has_inflow {
            return Err(IrrError::Unsolvable(
                "Schedule has no sign change".to_string(),
            )
            .into());
        }

        let anchor = flows
            .iter()
            .map(|f| f.date)
            .min()
            .expect("flows is non-empty");

        let mut lo = RATE_LOWER_BOUND;
        let mut hi = RATE_UPPER_BOUND;
        let npv_lo = Self::net_present_value(&flows, anchor, lo);
        let npv_hi = Self::net_present_value(&flows, anchor, hi);

        if npv_lo * npv_hi > 0.0 {
            return Err(IrrError::Unsolvable(format!(
                "No root in rate window [{}, {}]",
                RATE_LOWER_BOUND, RATE_UPPER_BOUND
            ))
            .into());
        }

        let mut mid = 0.0;
        for _ in 0..MAX_ITERATIONS {
            mid = (lo + hi) / 2.0;
            let npv_mid = Self::net_present_value(&flows, anchor, mid);

            if npv_mid.abs() < CONVERGENCE_EPSILON || (hi - lo) < CONVERGENCE_EPSILON {
                break;
            }
            if npv_lo * npv_mid < 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        debug!(
            "Solved IRR {:.6} over {} flows anchored at {}",
            mid,
            flows.len(),
            anchor
        );
        Ok(mid)
    }
}
