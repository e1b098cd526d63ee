use bridge_gad::errors::exit;
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use std::fs;
use std::process::Command;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: cargo xtask <command> <dir> [format]");
        eprintln!("Commands:");
        eprintln!("  batch <dir> [dxf|pdf|png]    Draw every parameter file in <dir>");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "batch" => {
            let format = args.get(3).map(String::as_str).unwrap_or("pdf");
            if !matches!(format, "dxf" | "pdf" | "png") {
                eprintln!("Unknown format: {format}");
                std::process::exit(1);
            }
            batch(Utf8Path::new(&args[2]), format)
        }
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            std::process::exit(1);
        }
    }
}

struct Outcome {
    input: Utf8PathBuf,
    output: Utf8PathBuf,
    code: i32,
    stderr: String,
}

fn batch(dir: &Utf8Path, format: &str) {
    let workspace = Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or(Utf8Path::new("."))
        .to_owned();
    let binary = build_driver(&workspace);

    let mut inputs: Vec<Utf8PathBuf> = dir
        .read_dir_utf8()
        .unwrap_or_else(|e| {
            eprintln!("Failed to read {dir}: {e}");
            std::process::exit(1);
        })
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.extension() == Some("csv"))
        .collect();
    inputs.sort();

    let out_dir = dir.join("drawings");
    if let Err(e) = fs::create_dir_all(&out_dir) {
        eprintln!("Failed to create {out_dir}: {e}");
        std::process::exit(1);
    }

    // one child process per drawing; nothing is shared between them
    let outcomes: Vec<Outcome> = inputs
        .par_iter()
        .map(|input| {
            let stem = input.file_stem().unwrap_or("drawing");
            let output = out_dir.join(format!("{stem}.{format}"));
            eprintln!("Drawing {input}...");
            run_driver(&binary, input, &output)
        })
        .collect();

    let mut failed = 0;
    for o in &outcomes {
        if o.code == 0 {
            println!("ok    {} -> {}", o.input, o.output);
        } else {
            failed += 1;
            println!("FAIL  {} ({}: {})", o.input, o.code, exit::describe(o.code));
            for line in o.stderr.lines().filter(|l| !l.trim().is_empty()).take(6) {
                println!("      {line}");
            }
        }
    }

    let summary = out_dir.join("summary.html");
    if let Err(e) = fs::write(&summary, summary_html(&outcomes)) {
        eprintln!("Failed to write {summary}: {e}");
    }

    println!(
        "\n{} drawn, {} failed, of {} parameter files (summary in {summary})",
        outcomes.len() - failed,
        failed,
        outcomes.len()
    );
    if failed > 0 {
        std::process::exit(1);
    }
}

fn build_driver(workspace: &Utf8Path) -> Utf8PathBuf {
    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let status = Command::new(cargo)
        .args(["build", "--release", "--bin", "bridge-gad"])
        .current_dir(workspace)
        .status();
    match status {
        Ok(s) if s.success() => {}
        Ok(s) => {
            eprintln!("Building bridge-gad failed: {s}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to run cargo: {e}");
            std::process::exit(1);
        }
    }
    workspace.join("target/release/bridge-gad")
}

fn run_driver(binary: &Utf8Path, input: &Utf8Path, output: &Utf8Path) -> Outcome {
    let result = Command::new(binary)
        .arg(input)
        .arg(output)
        .arg("--silent")
        .output();
    let (code, stderr) = match result {
        Ok(out) => (
            out.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&out.stderr).into_owned(),
        ),
        Err(e) => (-1, format!("Failed to run {binary}: {e}")),
    };
    Outcome {
        input: input.to_owned(),
        output: output.to_owned(),
        code,
        stderr,
    }
}

fn summary_html(outcomes: &[Outcome]) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>bridge-gad batch</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 24px; background: #eee; color: #333; }
        table { border-collapse: collapse; background: #fff; }
        td, th { padding: 6px 12px; border-bottom: 1px solid #ddd; text-align: left; vertical-align: top; }
        .ok { color: #2a7a2a; }
        .fail { color: #b22; }
        pre { margin: 0; font-size: 12px; white-space: pre-wrap; }
    </style>
</head>
<body>
<h1>Batch drawings</h1>
<table>
<tr><th>Parameters</th><th>Result</th><th>Details</th></tr>
"#,
    );
    for o in outcomes {
        let (class, result, details) = if o.code == 0 {
            let name = o.output.file_name().unwrap_or_default();
            (
                "ok",
                "ok".to_string(),
                format!(r#"<a href="{0}">{0}</a>"#, html_escape(name)),
            )
        } else {
            (
                "fail",
                format!("{} ({})", o.code, exit::describe(o.code)),
                format!("<pre>{}</pre>", html_escape(&o.stderr)),
            )
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"{class}\">{result}</td><td>{details}</td></tr>\n",
            html_escape(o.input.as_str())
        ));
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
