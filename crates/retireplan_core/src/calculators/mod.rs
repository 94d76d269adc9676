//! Pure sizing calculators used by the strategy rules and the projection engine
//!
//! Every function here is a pure function of account snapshots, settings and
//! year context. None of them mutate state; the rules turn their answers into
//! balance modifications.

pub mod conversion;
pub mod harvesting;
pub mod rmd;

pub use conversion::{
    ConversionLot, ProRataSplit, bracket_fill_conversion, consume_seasoned_conversions,
    fixed_conversion, mega_backdoor_room, penalty_free_amount, percentage_conversion,
    pro_rata_split, seasoned_conversions,
};
pub use harvesting::{
    HarvestCandidate, HarvestPlan, find_harvest_candidates, harvest_target, plan_harvest,
};
pub use rmd::{QcdAllocation, calculate_rmd, qcd_eligible, rmds_for_accounts, size_qcd};
