use std::collections::HashMap;

use crate::recipes::dto::RouteStats;
use crate::recipes::repo_types::{Recipe, Route};

/// Mode of the route tags. Ties go to the route enumerated first.
pub fn most_common_route(recipes: &[Recipe]) -> RouteStats {
    let mut counts: HashMap<Route, usize> = HashMap::new();
    for r in recipes {
        *counts.entry(r.route).or_default() += 1;
    }

    let total = recipes.len();
    let mut best: Option<(Route, usize)> = None;
    for route in Route::ALL {
        let count = counts.get(&route).copied().unwrap_or(0);
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((route, count));
        }
    }

    match best {
        Some((route, count)) => RouteStats {
            route: Some(route),
            count,
            total,
            percentage: count as f64 / total as f64 * 100.0,
        },
        None => RouteStats {
            route: None,
            count: 0,
            total: 0,
            percentage: 0.0,
        },
    }
}
