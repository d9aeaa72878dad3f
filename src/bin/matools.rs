//! matools CLI - Military Analyst toolbox utilities

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use matools::core::catalog::CatalogKind;
use matools::core::observer::{observer_extent, Observer};
use matools::core::schema::{observer_fields, FieldDef};
use matools::io::{generate_temp_name, generate_unique_name, MaOptions, TempWorkspace, ToolContext};
use matools::{
    convert_angular_units, convert_area_units, convert_linear_units, envelope_relation, z_factor,
    Envelope, ResourceKind, SpatialReference,
};

#[derive(Parser)]
#[command(name = "matools")]
#[command(author, version, about = "Military Analyst toolbox utilities", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// MA options file (defaults to $MA_OPTIONS or the user config directory)
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitFamily {
    Linear,
    Angular,
    Area,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaName {
    Observer,
    Dted,
    Rpf,
    Vpf,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify envelope A against envelope B ("left bottom right top")
    Relation {
        #[arg(allow_hyphen_values = true)]
        a: Envelope,
        #[arg(allow_hyphen_values = true)]
        b: Envelope,
    },
    /// Convert a value between units of one family
    Convert {
        #[arg(value_enum)]
        family: UnitFamily,
        #[arg(allow_hyphen_values = true)]
        value: f64,
        from: String,
        to: String,
    },
    /// Print a name that does not exist yet in a directory
    UniqueName {
        name: String,
        /// Directory to check; relative paths resolve against the current directory
        container: String,
    },
    /// Print a scratch path for a resource kind in a workspace
    TempName {
        /// Workspace; relative paths resolve against the current directory
        container: String,
        /// RasterDataset, NoDataRasterDataset, FeatureClass, ProjectionFile or AsciiFile
        kind: ResourceKind,
    },
    /// Create a scratch workspace and print its path; the workspace is left in place
    TempWorkspace,
    /// Print the fields of a fixed schema
    Schema {
        #[arg(value_enum)]
        name: SchemaName,
    },
    /// Grow an extent by 1.5 times the largest observer radius
    ObserverExtent {
        #[arg(allow_hyphen_values = true)]
        extent: Envelope,
        /// Largest observer radius
        #[arg(short, long, default_value = "1000")]
        radius: f64,
        /// Units of the radius (defaults to the MA options, then meters)
        #[arg(short, long)]
        units: Option<String>,
        /// Linear unit of a projected dataset; geographic WGS84 when omitted
        #[arg(long)]
        linear_unit: Option<String>,
    },
    /// Degrees per meter at a latitude
    Zfactor {
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
    },
    /// Print the properties and estimated map scale of a raster file
    #[cfg(feature = "gdal")]
    RasterInfo { raster: PathBuf },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn print_fields(title: &str, fields: &[FieldDef]) {
    println!("{}:", title);
    for field in fields {
        println!("  {}", field);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let options = match &cli.options {
        Some(path) => MaOptions::load_from(path)
            .with_context(|| format!("Failed to read options {}", path.display()))?,
        None => MaOptions::load(),
    };
    let cwd = std::env::current_dir().context("No current directory")?;
    let ctx = ToolContext::new(cwd).with_options(options);

    match cli.command {
        Commands::Relation { a, b } => {
            let relation = envelope_relation(&a, &b);
            println!("{} {}", relation.code(), relation);
        }

        Commands::Convert {
            family,
            value,
            from,
            to,
        } => {
            let converted = match family {
                UnitFamily::Linear => convert_linear_units(value, &from, &to),
                UnitFamily::Angular => convert_angular_units(value, &from, &to),
                UnitFamily::Area => convert_area_units(value, &from, &to),
            }?;
            println!("{}", converted);
        }

        Commands::UniqueName { name, container } => {
            println!("{}", generate_unique_name(&name, ctx.dataset_path(&container)));
        }

        Commands::TempName { container, kind } => {
            let path = generate_temp_name(ctx.dataset_path(&container), kind)?;
            println!("{}", path.display());
        }

        Commands::TempWorkspace => {
            let path = TempWorkspace::acquire(&ctx).keep();
            println!("{}", path.display());
        }

        Commands::Schema { name } => match name {
            SchemaName::Observer => print_fields("Observer fields", &observer_fields()),
            SchemaName::Dted | SchemaName::Rpf | SchemaName::Vpf => {
                let kind = match name {
                    SchemaName::Dted => CatalogKind::Dted,
                    SchemaName::Rpf => CatalogKind::Rpf,
                    _ => CatalogKind::Vpf,
                };
                print_fields(&format!("{} catalog", kind), &kind.fields());
                if let Some((table, fields)) = kind.companion_table("<name>") {
                    print_fields(&table, &fields);
                }
            }
        },

        Commands::ObserverExtent {
            extent,
            radius,
            units,
            linear_unit,
        } => {
            let sr = match linear_unit {
                Some(unit) => SpatialReference::projected("Projected", &unit),
                None => SpatialReference::geographic_wgs84(),
            };
            let mut observer = Observer::default();
            observer.radius2 = radius;
            let units = units.unwrap_or_else(|| ctx.distance_units().to_string());
            let grown = observer_extent(&extent, &[observer], &units, &sr)?;
            println!("{}", grown);
        }

        Commands::Zfactor { latitude } => {
            println!("{:.6}", z_factor(latitude)?);
        }

        #[cfg(feature = "gdal")]
        Commands::RasterInfo { raster } => {
            let description = matools::io::RasterReader::describe(&raster)
                .with_context(|| format!("Failed to read {}", raster.display()))?;
            let geographic = description
                .spatial_reference
                .as_ref()
                .map(SpatialReference::is_geographic)
                .unwrap_or(false);
            println!("Format: {}", description.format.as_deref().unwrap_or("unknown"));
            println!(
                "Size: {} x {}",
                description.width.unwrap_or(0),
                description.height.unwrap_or(0)
            );
            if let Some(sr) = &description.spatial_reference {
                println!("Spatial reference: {}", sr.name);
            }
            if let Some(extent) = description.extent {
                println!("Extent: {}", extent);
                let scale = matools::core::scale_from_raster(
                    description.width.unwrap_or(0),
                    &extent,
                    geographic,
                );
                println!("Scale: {}", scale);
            }
        }
    }

    Ok(())
}
