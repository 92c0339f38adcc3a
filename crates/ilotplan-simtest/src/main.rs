//! ilotplan Headless Layout Harness
//!
//! Runs the layout pipeline over built-in scenarios for every profile and a
//! handful of seeds, and checks layout invariants. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p ilotplan-simtest
//!   cargo run -p ilotplan-simtest -- --verbose
//!   cargo run -p ilotplan-simtest -- --plan my_plan.json --config my_config.json --seed 7 --json
//!
//! Set `RUST_LOG=debug` for engine logs.

use ilotplan_logic::corridors::{synthesize_corridors, CorridorKind};
use ilotplan_logic::geometry::{circle_polygon, rectangle, Point};
use ilotplan_logic::plan::{RestrictedArea, RestrictedCategory, Zone, ZoneCategory};
use ilotplan_logic::validation::{validate_layout, Severity};
use ilotplan_logic::{
    generate_layout, FloorPlan, Ilot, InputWarning, Layout, LayoutConfig, LayoutProfile,
    SequentialIds,
};

// ── Sample plan (two open offices, a meeting room, a stair core) ────────
const OFFICE_PLAN_JSON: &str = include_str!("../../../data/office_plan.json");

const DEFAULT_SEEDS: [u64; 3] = [1, 42, 2024];

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

#[derive(Default)]
struct Options {
    verbose: bool,
    json: bool,
    seed: Option<u64>,
    plan: Option<String>,
    config: Option<String>,
}

impl Options {
    fn parse() -> Result<Self, String> {
        let mut opts = Options::default();
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--verbose" => opts.verbose = true,
                "--json" => opts.json = true,
                "--seed" => {
                    let value = args.next().ok_or("--seed needs a value")?;
                    let seed = value
                        .parse()
                        .map_err(|e| format!("bad --seed '{}': {}", value, e))?;
                    opts.seed = Some(seed);
                }
                "--plan" => opts.plan = Some(args.next().ok_or("--plan needs a path")?),
                "--config" => opts.config = Some(args.next().ok_or("--config needs a path")?),
                other => return Err(format!("unknown argument '{}'", other)),
            }
        }
        Ok(opts)
    }

    fn seeds(&self) -> Vec<u64> {
        match self.seed {
            Some(s) => vec![s],
            None => DEFAULT_SEEDS.to_vec(),
        }
    }
}

fn main() {
    let opts = match Options::parse() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };
    let default_filter = if opts.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    println!("=== ilotplan Layout Harness ===\n");

    let mut results = Vec::new();

    // 1. Inputs (plan + config)
    let inputs = load_inputs(&opts, &mut results);

    if let Some((plan, config)) = &inputs {
        // 2. Supplied or sample plan, every seed
        results.extend(validate_plan_layouts(plan, config, &opts.seeds(), opts.verbose));

        // 3. Determinism
        results.extend(validate_determinism(plan, config, &opts.seeds()));
    }

    // 4. Profiles on an open room
    results.extend(validate_profiles(&opts.seeds(), opts.verbose));

    // 5. Edge scenarios
    results.extend(validate_edge_scenarios(opts.verbose));

    // 6. Corridor synthesis on fixed rows
    results.extend(validate_row_corridors(opts.verbose));

    // 7. Configuration rejection
    results.extend(validate_config_rules());

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || opts.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if opts.json {
        if let Some((plan, config)) = &inputs {
            let seed = opts.seeds()[0];
            match generate_layout(plan, config, seed).and_then(|l| l.to_json()) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn read_file(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))
}

// ── 1. Inputs ───────────────────────────────────────────────────────────

fn load_inputs(opts: &Options, results: &mut Vec<TestResult>) -> Option<(FloorPlan, LayoutConfig)> {
    println!("--- Inputs ---");

    let plan_json = match &opts.plan {
        Some(path) => read_file(path),
        None => Ok(OFFICE_PLAN_JSON.to_string()),
    };
    let plan = match plan_json.and_then(|j| FloorPlan::from_json(&j).map_err(|e| e.to_string())) {
        Ok(p) => p,
        Err(e) => {
            results.push(TestResult {
                name: "plan_parse".into(),
                passed: false,
                detail: e,
            });
            return None;
        }
    };
    results.push(TestResult {
        name: "plan_parse".into(),
        passed: !plan.rooms.is_empty(),
        detail: format!(
            "{} rooms, {} walls, {} restricted areas, {} entrances",
            plan.rooms.len(),
            plan.walls.len(),
            plan.restricted_areas.len(),
            plan.entrances.len()
        ),
    });

    let config = match &opts.config {
        Some(path) => {
            match read_file(path)
                .and_then(|j| LayoutConfig::from_json(&j).map_err(|e| e.to_string()))
            {
                Ok(c) => c,
                Err(e) => {
                    results.push(TestResult {
                        name: "config_parse".into(),
                        passed: false,
                        detail: e,
                    });
                    return None;
                }
            }
        }
        None => LayoutConfig::default(),
    };
    results.push(TestResult {
        name: "config_parse".into(),
        passed: true,
        detail: format!(
            "profile {}%, spacing {}, corridor width {}",
            config.placement.layout_profile.percent(),
            config.placement.min_ilot_spacing,
            config.placement.corridor_width
        ),
    });

    Some((plan, config))
}

// ── 2. Plan layouts ─────────────────────────────────────────────────────

fn validate_plan_layouts(
    plan: &FloorPlan,
    config: &LayoutConfig,
    seeds: &[u64],
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Plan Layouts ---");
    let mut results = Vec::new();

    for &seed in seeds {
        let layout = match generate_layout(plan, config, seed) {
            Ok(l) => l,
            Err(e) => {
                results.push(TestResult {
                    name: format!("plan_generate_seed_{}", seed),
                    passed: false,
                    detail: e.to_string(),
                });
                continue;
            }
        };
        if verbose {
            print_layout_summary(&layout, seed);
        }

        let checks = validate_layout(&layout, plan, config);
        let errors: Vec<_> = checks
            .iter()
            .filter(|c| c.severity == Severity::Error)
            .collect();
        let warnings = checks.len() - errors.len();
        results.push(TestResult {
            name: format!("plan_valid_seed_{}", seed),
            passed: errors.is_empty(),
            detail: match errors.first() {
                None => format!(
                    "{} ilots, {} corridors, {} warnings",
                    layout.ilots.len(),
                    layout.corridors.len(),
                    warnings
                ),
                Some(e) => format!("{} errors, first [{}]: {}", errors.len(), e.category, e.message),
            },
        });

        let spines = layout
            .corridors
            .iter()
            .filter(|c| c.kind == CorridorKind::MainSpine)
            .count();
        let tolerance = config.corridors.connection_tolerance;
        let isolated = layout
            .ilots
            .iter()
            .filter(|i| {
                !layout
                    .corridors
                    .iter()
                    .any(|c| c.touches(&i.footprint(), tolerance))
            })
            .count();
        results.push(TestResult {
            name: format!("plan_circulation_seed_{}", seed),
            passed: spines == 1 && isolated == 0,
            detail: format!(
                "{} spine(s), {} of {} ilots off the network",
                spines,
                isolated,
                layout.ilots.len()
            ),
        });

        let target = config.placement.layout_profile.percent() as f64;
        results.push(TestResult {
            name: format!("plan_utilization_seed_{}", seed),
            passed: layout.stats.utilization_pct <= target + 1e-6,
            detail: format!(
                "{:.1}% of {:.1} m² (target {}%)",
                layout.stats.utilization_pct, layout.stats.available_area, target
            ),
        });
    }
    results
}

fn print_layout_summary(layout: &Layout, seed: u64) {
    let s = &layout.stats;
    println!(
        "  seed {:>5}: {:>3} ilots  {:>6.1} m²  {:>5.1}%  score {:>6.2}  corridors {:>3} ({:.1} m)",
        seed,
        s.ilot_count,
        s.total_ilot_area,
        s.utilization_pct,
        s.score.total,
        s.corridor_count,
        s.total_corridor_length
    );
    let tiers: Vec<String> = s
        .tier_counts
        .iter()
        .map(|(t, n)| format!("{}={}", t.name(), n))
        .collect();
    println!("              tiers: {}", tiers.join(" "));
    for w in &layout.warnings {
        println!("              warning: {}", w);
    }
}

// ── 3. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(plan: &FloorPlan, config: &LayoutConfig, seeds: &[u64]) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let seed = seeds.first().copied().unwrap_or(1);
    let first = generate_layout(plan, config, seed).and_then(|l| l.to_json());
    let second = generate_layout(plan, config, seed).and_then(|l| l.to_json());
    let same = matches!((&first, &second), (Ok(a), Ok(b)) if a == b);
    vec![TestResult {
        name: "deterministic_seed".into(),
        passed: same,
        detail: format!("seed {} reproduced: {}", seed, same),
    }]
}

// ── 4. Profiles ─────────────────────────────────────────────────────────

fn open_room() -> FloorPlan {
    FloorPlan {
        rooms: vec![Zone::new(
            rectangle(0.0, 0.0, 30.0, 20.0),
            ZoneCategory::Available,
        )],
        ..Default::default()
    }
}

fn validate_profiles(seeds: &[u64], verbose: bool) -> Vec<TestResult> {
    println!("--- Profiles ---");
    let mut results = Vec::new();
    let plan = open_room();

    for &profile in LayoutProfile::all() {
        let config = LayoutConfig::with_profile(profile);
        let target = profile.percent() as f64;
        let mut worst: f64 = 0.0;
        let mut failures = 0;
        for &seed in seeds {
            match generate_layout(&plan, &config, seed) {
                Ok(layout) => {
                    let pct = layout.stats.utilization_pct;
                    if verbose {
                        println!("  {:>2}% seed {:>5}: {:.1}%", target, seed, pct);
                    }
                    worst = worst.max((pct - target).abs());
                    let errors = validate_layout(&layout, &plan, &config)
                        .iter()
                        .filter(|c| c.severity == Severity::Error)
                        .count();
                    if pct > target + 1e-6 || errors > 0 {
                        failures += 1;
                    }
                }
                Err(_) => failures += 1,
            }
        }
        results.push(TestResult {
            name: format!("profile_{}", target),
            passed: failures == 0 && worst <= 15.0,
            detail: format!(
                "max drift {:.1} points over {} seeds, {} failing",
                worst,
                seeds.len(),
                failures
            ),
        });
    }
    results
}

// ── 5. Edge scenarios ───────────────────────────────────────────────────

fn validate_edge_scenarios(verbose: bool) -> Vec<TestResult> {
    println!("--- Edge Scenarios ---");
    let mut results = Vec::new();

    // Small room, capped tier size
    let mut config = LayoutConfig::default();
    config.placement.max_ilot_size = 4.0;
    let small = FloorPlan {
        rooms: vec![Zone::new(
            rectangle(0.0, 0.0, 10.0, 10.0),
            ZoneCategory::Available,
        )],
        ..Default::default()
    };
    let outcome = generate_layout(&small, &config, 42);
    results.push(TestResult {
        name: "small_room".into(),
        passed: outcome.as_ref().is_ok_and(|l| {
            !l.ilots.is_empty()
                && l.stats.total_ilot_area <= 25.0 + 1e-6
                && l.ilots.iter().all(|i| i.area <= 4.0)
        }),
        detail: match &outcome {
            Ok(l) => format!("{} ilots, {:.1} m²", l.ilots.len(), l.stats.total_ilot_area),
            Err(e) => e.to_string(),
        },
    });

    // Restricted circle
    let mut circle = FloorPlan {
        rooms: vec![Zone::new(
            rectangle(0.0, 0.0, 20.0, 20.0),
            ZoneCategory::Available,
        )],
        ..Default::default()
    };
    circle.restricted_areas.push(RestrictedArea::new(
        circle_polygon(Point::new(5.0, 5.0), 2.0, 32),
        RestrictedCategory::Mechanical,
    ));
    let config = LayoutConfig::default();
    let min_allowed = 2.0 + config.grid.restricted_clearance - 0.01;
    let outcome = generate_layout(&circle, &config, 42);
    let closest = outcome.as_ref().ok().map(|l| {
        l.ilots
            .iter()
            .map(|i| i.center.distance(&Point::new(5.0, 5.0)))
            .fold(f64::INFINITY, f64::min)
    });
    results.push(TestResult {
        name: "restricted_clearance".into(),
        passed: closest.is_some_and(|d| d >= min_allowed),
        detail: format!("closest center {:.3} (min {:.2})", closest.unwrap_or(0.0), min_allowed),
    });

    // Nothing available
    let none = FloorPlan {
        rooms: vec![Zone::new(
            rectangle(0.0, 0.0, 10.0, 10.0),
            ZoneCategory::Restricted,
        )],
        ..Default::default()
    };
    let outcome = generate_layout(&none, &config, 1);
    results.push(TestResult {
        name: "no_available_zones".into(),
        passed: outcome.as_ref().is_ok_and(|l| {
            l.ilots.is_empty() && l.warnings.contains(&InputWarning::NoAvailableZones)
        }),
        detail: match &outcome {
            Ok(l) => format!("{} ilots, {} warnings", l.ilots.len(), l.warnings.len()),
            Err(e) => e.to_string(),
        },
    });
    if verbose {
        if let Ok(l) = &outcome {
            for w in &l.warnings {
                println!("  warning: {}", w);
            }
        }
    }
    results
}

// ── 6. Row corridors ────────────────────────────────────────────────────

fn desk(id: u32, x: f64, y: f64) -> Ilot {
    let mut ilot = Ilot::new(
        id,
        Point::new(x, y),
        ilotplan_logic::catalogue::SizeTier::Standard,
        false,
        0,
    );
    ilot.width = 2.0;
    ilot.height = 1.0;
    ilot.area = 2.0;
    ilot
}

fn validate_row_corridors(verbose: bool) -> Vec<TestResult> {
    println!("--- Row Corridors ---");
    let mut results = Vec::new();

    // Two aligned rows five apart
    let ilots: Vec<Ilot> = [(0.0, 0.0), (3.0, 0.0), (6.0, 0.0), (0.0, 5.0), (3.0, 5.0), (6.0, 5.0)]
        .iter()
        .enumerate()
        .map(|(n, &(x, y))| desk(n as u32 + 1, x, y))
        .collect();
    let plan = FloorPlan {
        rooms: vec![Zone::new(
            rectangle(-2.0, -2.0, 12.0, 8.0),
            ZoneCategory::Available,
        )],
        ..Default::default()
    };
    let net = synthesize_corridors(
        &ilots,
        &plan,
        &LayoutConfig::default(),
        &mut SequentialIds::new(),
    );
    if verbose {
        for c in &net.corridors {
            println!(
                "  #{:<3} {:?} {:.2} m, ilots {:?}",
                c.id, c.kind, c.length, c.connected_ilots
            );
        }
    }

    let pairs: Vec<_> = net
        .corridors
        .iter()
        .filter(|c| c.kind == CorridorKind::RowPair)
        .collect();
    results.push(TestResult {
        name: "row_pair_single".into(),
        passed: pairs.len() == 1
            && (pairs[0].length - 4.0).abs() < 1e-6
            && pairs[0].connected_ilots == [1, 4].into_iter().collect(),
        detail: format!(
            "{} row-pair corridors, lengths {:?}",
            pairs.len(),
            pairs.iter().map(|c| c.length).collect::<Vec<_>>()
        ),
    });
    results.push(TestResult {
        name: "corridors_clear_of_ilots".into(),
        passed: net
            .corridors
            .iter()
            .all(|c| c.is_valid() && ilots.iter().all(|i| !c.overlaps_ilot(i))),
        detail: format!("{} corridors, {} skipped", net.corridors.len(), net.skipped),
    });
    results.push(TestResult {
        name: "every_ilot_connected".into(),
        passed: ilots
            .iter()
            .all(|i| net.corridors.iter().any(|c| c.touches(&i.footprint(), 0.5))),
        detail: format!("{} ilots", ilots.len()),
    });
    results
}

// ── 7. Configuration ────────────────────────────────────────────────────

fn validate_config_rules() -> Vec<TestResult> {
    println!("--- Configuration ---");
    let mut results = Vec::new();

    let mut cases: Vec<(&str, LayoutConfig)> = Vec::new();
    let mut c = LayoutConfig::default();
    c.placement.min_ilot_spacing = 0.0;
    cases.push(("zero_spacing", c));
    let mut c = LayoutConfig::default();
    c.placement.corridor_width = -1.0;
    cases.push(("negative_corridor_width", c));
    let mut c = LayoutConfig::default();
    c.placement.max_ilot_size = 0.5;
    cases.push(("ilot_size_below_smallest_tier", c));
    let mut c = LayoutConfig::default();
    c.grid.resolution = 0.0;
    cases.push(("zero_resolution", c));

    let plan = open_room();
    for (name, config) in cases {
        let rejected = generate_layout(&plan, &config, 1).is_err();
        results.push(TestResult {
            name: format!("config_rejects_{}", name),
            passed: rejected,
            detail: if rejected {
                "rejected before placement".into()
            } else {
                "accepted".into()
            },
        });
    }

    let unsupported = LayoutConfig::from_json(r#"{"placement": {"layout_profile": 50}}"#);
    results.push(TestResult {
        name: "config_rejects_unknown_profile".into(),
        passed: unsupported.is_err(),
        detail: match unsupported {
            Ok(_) => "accepted".into(),
            Err(e) => e.to_string(),
        },
    });
    results
}
