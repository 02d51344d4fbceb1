//! Validate a framework manifest and print the versions it records.
//!
//! Reads the manifest named by `--manifest` (or `FACADE_MANIFEST`), validates
//! it against the bundled schema, and prints `{"project": ..., "frameworks":
//! {...}}` as compact JSON. `--families` narrows the output; requested
//! families the manifest does not mention are reported as `null`.

use anyhow::{Result, anyhow, bail};
use facadekit::{FamilyId, FrameworkManifest, ResolutionContext, manifest_path_from_env, split_list};
use serde_json::{Map, Value, json};
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let path = match args.manifest.or_else(manifest_path_from_env) {
        Some(path) => path,
        None => bail!("no manifest given; pass --manifest PATH or set FACADE_MANIFEST"),
    };
    let manifest = FrameworkManifest::load(&path)?;

    println!("{}", serde_json::to_string(&render(&manifest, &args.families))?);
    Ok(())
}

fn render(manifest: &FrameworkManifest, families: &[FamilyId]) -> Value {
    let mut frameworks = Map::new();
    if families.is_empty() {
        for (family, version) in manifest.entries() {
            frameworks.insert(family.0.clone(), json!(version.to_string()));
        }
    } else {
        for family in families {
            let version = manifest
                .version_of(family)
                .map(|version| json!(version.to_string()))
                .unwrap_or(Value::Null);
            frameworks.insert(family.0.clone(), version);
        }
    }
    json!({
        "project": manifest.project,
        "frameworks": frameworks,
    })
}

struct CliArgs {
    manifest: Option<PathBuf>,
    families: Vec<FamilyId>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut manifest: Option<PathBuf> = None;
        let mut families: Vec<FamilyId> = Vec::new();

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--manifest" => {
                    if manifest.is_some() {
                        bail!("--manifest may only be provided once");
                    }
                    manifest = Some(PathBuf::from(next_value(&mut args, "--manifest")?));
                }
                "--families" => {
                    let raw = next_value(&mut args, "--families")?;
                    families.extend(split_list(&raw).into_iter().map(FamilyId));
                }
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        Ok(CliArgs { manifest, families })
    }
}

fn next_value(args: &mut impl Iterator<Item = std::ffi::OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn usage() -> &'static str {
    "Usage: facade-manifest [--manifest PATH] [--families fam1,fam2]\n\
Validates a framework manifest (default: $FACADE_MANIFEST) and prints the detected versions as compact JSON.\n"
}
