use chrono::Utc;

use crate::cli::Cli;
use crate::domain::constants::CONTROLLED_APPLICATIONS;
use crate::domain::models::{
    ApplicationGates, DecodeReport, HarvestReport, JsonOut, MacroInspection, PolicyStatusReport,
    Warning,
};
use crate::registry::RegistrySource;
use crate::services::config::{effective_window_days, ConfigError, ConfigFile};
use crate::services::decoder;
use crate::services::gate::GateToggle;
use crate::services::harvest::{self, HarvestOptions};
use crate::services::macros::{MacroExtractor, ToolMacroExtractor};
use crate::services::output::print_one;

pub fn handle_harvest(
    cli: &Cli,
    days: Option<u32>,
    full: bool,
    check_macros: bool,
    macro_tool: Option<&str>,
    config: &ConfigFile,
) -> anyhow::Result<()> {
    let window_days = effective_window_days(days, full, &config.general);

    if macro_tool.is_some() && !check_macros {
        return Err(ConfigError(
            "--macro-tool only makes sense together with --check-macros".to_string(),
        )
        .into());
    }
    let tool = if check_macros {
        let command = macro_tool
            .map(str::to_string)
            .or_else(|| config.general.macro_tool.clone())
            .ok_or_else(|| {
                ConfigError(
                    "macro inspection requested but no macro tool is configured \
                     (pass --macro-tool or set macro_tool in the config file)"
                        .to_string(),
                )
            })?;
        Some(ToolMacroExtractor::new(&command).map_err(|e| ConfigError(e.to_string()))?)
    } else {
        None
    };

    let source = RegistrySource::open(cli.snapshot.as_deref())?;
    let resolver = source.resolver();
    let report = harvest::run(
        source.registry(),
        resolver.as_ref(),
        tool.as_ref().map(|t| t as &dyn MacroExtractor),
        &HarvestOptions {
            window_days,
            check_macros,
        },
        Utc::now(),
    );

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: true,
                data: report
            })?
        );
    } else {
        render_harvest_text(&report);
    }
    Ok(())
}

fn render_harvest_text(report: &HarvestReport) {
    println!(
        "Enumerating Office most recently used files for the last {} days",
        report.window_days
    );
    if report.macro_inspection == MacroInspection::Enabled {
        println!("Macro inspection is enabled for this run");
    }
    println!();
    println!(
        "  {:<8}  {:<23}  {:<12}  {}",
        "App", "User", "LastAccess", "FileName"
    );
    println!(
        "  {:<8}  {:<23}  {:<12}  {}",
        "---", "----", "----------", "--------"
    );
    for record in &report.records {
        println!(
            "  {:<8}  {:<23}  {:<12}  {}",
            record.application,
            record.user,
            record.last_access.format("%Y-%m-%d"),
            record.target
        );
        if let Some(modules) = &record.macros {
            for module in modules {
                if module.code.trim().is_empty() {
                    continue;
                }
                println!("    Macro Module: {}", module.name);
                println!("    Macro Code:   {}", module.code);
                println!("  -----------------------");
            }
        }
    }
    print_warnings(&report.warnings);
}

fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("warning: {}", warning.message);
    }
}

pub fn handle_policy_status(cli: &Cli) -> anyhow::Result<()> {
    let source = RegistrySource::open(cli.snapshot.as_deref())?;
    let gate = GateToggle::new(source.registry());

    let applications = CONTROLLED_APPLICATIONS
        .iter()
        .map(|app| ApplicationGates {
            application: app.to_string(),
            user_state: gate.peek(app),
            machine_blocking: gate.machine_blocks(app),
            gates: gate.gates(app),
        })
        .collect();
    let report = PolicyStatusReport { applications };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: true,
                data: report
            })?
        );
    } else {
        for app in &report.applications {
            println!(
                "{}\tuser_state={:?}\tmachine_blocking={}",
                app.application, app.user_state, app.machine_blocking
            );
            for row in &app.gates {
                println!(
                    "  {:?}\t{}\t{}",
                    row.scope,
                    row.version,
                    row.value
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "absent".to_string())
                );
            }
        }
    }
    Ok(())
}

pub fn handle_decode(cli: &Cli, value: &str) -> anyhow::Result<()> {
    let report = decoder::decode(value).map(|entry| DecodeReport {
        target: entry.target,
        last_access: entry.last_access,
        timestamp_valid: entry.timestamp_valid,
    });
    print_one(cli.json, report, |r| match r {
        Some(d) => format!(
            "{}\t{}{}",
            d.last_access.to_rfc3339(),
            d.target,
            if d.timestamp_valid {
                ""
            } else {
                "\t(timestamp unparsed)"
            }
        ),
        None => "no mru pattern match".to_string(),
    })
}
