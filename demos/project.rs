//! Load shape tree from JSON and print its perspective projection as JSON
#![deny(warnings)]

use foreshorten::*;
use std::{
    env,
    fs::File,
    io::{BufReader, Read},
};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

type Error = Box<dyn std::error::Error>;

#[derive(Debug)]
struct Args {
    input_file: String,
    view_box: Option<BBox>,
    pretty: bool,
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut result = Args {
            input_file: String::new(),
            view_box: None,
            pretty: false,
        };
        let mut positional = 0;
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "project".to_owned());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "-h" => {
                    positional = 0;
                    break;
                }
                "-v" => {
                    let view_box = args.next().ok_or("-v requires argument")?;
                    let values = view_box
                        .split([',', ' '])
                        .filter(|value| !value.is_empty())
                        .map(str::parse)
                        .collect::<Result<Vec<Scalar>, _>>()?;
                    match values.as_slice() {
                        &[x, y, width, height] => {
                            result.view_box = Some(BBox::from_view_box(x, y, width, height))
                        }
                        _ => return Err("view box requires four numbers".into()),
                    }
                }
                "-p" => {
                    result.pretty = true;
                }
                _ => {
                    positional += 1;
                    match positional {
                        1 => result.input_file = arg,
                        _ => return Err("unexpected positional argument".into()),
                    }
                }
            }
        }
        if positional < 1 {
            eprintln!("Project shapes placed in 3D and print resulting primitives as JSON");
            eprintln!("\nUSAGE:");
            eprintln!("    {} [-v <view_box>] [-p] <shape.json>", cmd);
            eprintln!("\nARGS:");
            eprintln!("    -v <view_box>      'x,y,width,height' used to compute clip path");
            eprintln!("    -p                 pretty print output");
            eprintln!("    <shape.json>       file containing shape tree ('-' means stdin)");
            std::process::exit(1);
        }
        Ok(result)
    }
}

/// Load shape tree from the file
fn shape_load(path: &str) -> Result<Shape, Error> {
    let shape = if path != "-" {
        Shape::from_json(BufReader::new(File::open(path)?))?
    } else {
        let mut contents = String::new();
        std::io::stdin().read_to_string(&mut contents)?;
        Shape::from_json(contents.as_bytes())?
    };
    Ok(shape)
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let shape = tracing::debug_span!("[load]").in_scope(|| shape_load(&args.input_file))?;

    let ctx = RenderContext::new();
    let primitives = tracing::debug_span!("[render]").in_scope(|| shape.render(&ctx))?;
    tracing::debug!("[primitives_count] {}", primitives.len());

    // clip path is only defined by the top level perspective
    let clip_path = match (shape.as_ref(), args.view_box) {
        (ShapeInner::Perspective { perspective, .. }, Some(view_box)) => {
            tracing::debug_span!("[clip]").in_scope(|| {
                ctx.with_perspective(perspective).clip_path(&view_box)
            })?
        }
        _ => None,
    };

    let output = serde_json::json!({
        "primitives": primitives,
        "clip_path": clip_path.as_ref().map(|polygon| polygon.as_scalars()),
    });
    if args.pretty {
        serde_json::to_writer_pretty(std::io::stdout(), &output)?;
    } else {
        serde_json::to_writer(std::io::stdout(), &output)?;
    }
    println!();
    Ok(())
}
