//! One-way analysis of variance.
//!
//! Each input slice is treated as one group. The age tests pass the raw
//! age-code vector and the raw measurement vector as the two groups, which
//! is the comparison the report has always printed; it is not an
//! age-stratified test.

use crate::error::AnalysisError;
use crate::models::{AgeRelationTests, AnovaResult, WalkingTable};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use tracing::{debug, warn};

/// One-way ANOVA over `groups`.
///
/// `F = (SSB / (k - 1)) / (SSW / (N - k))` with the p-value taken from the
/// upper tail of F(k - 1, N - k). When within-group variance vanishes the
/// result is `F = inf, p = 0` if the group means differ, and `NaN` for both
/// if they do not. `NaN` inputs propagate to a `NaN` result.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<AnovaResult, AnalysisError> {
    if groups.len() < 2 {
        return Err(AnalysisError::InvalidAnova(format!(
            "need at least 2 groups, got {}",
            groups.len()
        )));
    }
    if let Some(pos) = groups.iter().position(|g| g.is_empty()) {
        return Err(AnalysisError::InvalidAnova(format!("group {} is empty", pos)));
    }

    let k = groups.len() as f64;
    let n: f64 = groups.iter().map(|g| g.len() as f64).sum();
    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let len = group.len() as f64;
        let mean = group.iter().sum::<f64>() / len;
        ss_between += len * (mean - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    }

    let df_between = k - 1.0;
    let df_within = n - k;

    let undefined = AnovaResult {
        f_statistic: f64::NAN,
        p_value: f64::NAN,
        df_between,
        df_within,
    };

    if ss_between.is_nan() || ss_within.is_nan() || df_within <= 0.0 {
        warn!("ANOVA is undefined for this input");
        return Ok(undefined);
    }

    if ss_within == 0.0 {
        if ss_between == 0.0 {
            warn!("All values are identical; ANOVA is undefined");
            return Ok(undefined);
        }
        return Ok(AnovaResult {
            f_statistic: f64::INFINITY,
            p_value: 0.0,
            df_between,
            df_within,
        });
    }

    let f_statistic = (ss_between / df_between) / (ss_within / df_within);
    let distribution = FisherSnedecor::new(df_between, df_within)
        .map_err(|e| AnalysisError::InvalidAnova(e.to_string()))?;
    let p_value = distribution.sf(f_statistic).clamp(0.0, 1.0);

    debug!(
        "ANOVA: F({}, {}) = {:.6}, p = {:.6e}",
        df_between, df_within, f_statistic, p_value
    );

    Ok(AnovaResult {
        f_statistic,
        p_value,
        df_between,
        df_within,
    })
}

/// Age codes vs steps and age codes vs average walking speed.
pub fn age_relation_tests(table: &WalkingTable) -> Result<AgeRelationTests, AnalysisError> {
    let ages: Vec<f64> = table.records.iter().map(|r| r.age as f64).collect();
    let steps: Vec<f64> = table.records.iter().map(|r| r.steps as f64).collect();
    let speeds: Vec<f64> = table.records.iter().map(|r| r.avg_walking_speed).collect();

    Ok(AgeRelationTests {
        steps: one_way_anova(&[&ages, &steps])?,
        speed: one_way_anova(&[&ages, &speeds])?,
    })
}
