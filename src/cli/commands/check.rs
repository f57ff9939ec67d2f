//! Check command - validate a configuration file offline.

use crate::cli::CheckArgs;
use crate::config::Config;
use anyhow::Result;

pub fn run_check(args: CheckArgs) -> Result<()> {
    let config = Config::load(&args.config)?;

    println!("config ok: {}", args.config.display());
    println!(
        "destinations: primary={} holding={} source={}",
        config.destinations.primary,
        config.destinations.holding,
        config.destinations.source.as_deref().unwrap_or("-")
    );
    println!(
        "policy: always_queue={} cap={} cycle={}s pause_when_primary_down={}",
        config.policy.always_queue,
        config.policy.max_promotions_per_cycle,
        config.policy.cycle_seconds,
        config.policy.pause_when_primary_down
    );

    let mut features = Vec::new();
    if config.filter.enabled {
        features.push("username-filter");
    }
    if config.availability.kick_when_down {
        features.push("kick-when-down");
    }
    if config.redirect.enabled {
        features.push("redirect-when-down");
    }
    if config.recovery.enabled {
        features.push("recovery");
    }
    if config.notify.sound {
        features.push("sound-notify");
    }
    println!(
        "features: {}",
        if features.is_empty() {
            "none".to_string()
        } else {
            features.join(", ")
        }
    );
    println!("soft_reject: mode={:?} percentage={}", config.soft_reject.mode, config.soft_reject.percentage);

    println!("tiers ({}):", config.tiers.len());
    for tier in &config.tiers {
        println!(
            "  {:<12} slots={:<4} permission={}",
            tier.name,
            tier.reserved_slots,
            tier.permission.as_deref().unwrap_or("(catch-all)")
        );
    }

    Ok(())
}
