//! The `inkgrade init` command.

use std::path::Path;

use anyhow::Result;

fn write_if_missing(path: &str, content: &str) -> Result<()> {
    let path = Path::new(path);
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    println!("Created {}", path.display());
    Ok(())
}

pub fn execute() -> Result<()> {
    write_if_missing("inkgrade.toml", SAMPLE_CONFIG)?;
    write_if_missing("exercises/example.toml", EXAMPLE_EXERCISE_SET)?;
    write_if_missing("attempts/wave-1.json", EXAMPLE_ATTEMPT)?;

    println!("\nNext steps:");
    println!("  1. Run: inkgrade validate --exercises exercises/example.toml");
    println!("  2. Run: inkgrade assess --exercises exercises --attempt attempts/wave-1.json");
    println!("  3. Run: inkgrade run --exercises exercises --attempts attempts");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# inkgrade configuration

parallelism = 4
output_dir = "./inkgrade-results"
# best-score change (in points) that compare reports as a decline or improvement
regression_threshold = 5.0
"#;

const EXAMPLE_EXERCISE_SET: &str = r##"[exercise_set]
id = "example"
name = "Example Exercises"
description = "One exercise of each kind to get started"

[[exercises]]
id = "wave"
title = "Trace the wave"
tags = ["line"]

[exercises.config]
type = "line"
target_path = "M 100 200 Q 200 100 300 200 Q 400 300 500 200"
stroke_tolerance = 20.0

[[exercises]]
id = "three-dots"
title = "Connect the dots"
tags = ["dots"]

[exercises.config]
type = "dots"
dot_radius = 15.0
dots = [
    { id = "1", x = 150.0, y = 300.0 },
    { id = "2", x = 300.0, y = 100.0 },
    { id = "3", x = 450.0, y = 300.0 },
]

[[exercises]]
id = "square"
title = "Draw a square"
passing_score = 60
tags = ["shape"]

[exercises.config]
type = "shape"
shape_type = "square"
target_bounds = { x = 200.0, y = 100.0, width = 200.0, height = 200.0 }
expected_corners = [
    { x = 200.0, y = 100.0 },
    { x = 400.0, y = 100.0 },
    { x = 400.0, y = 300.0 },
    { x = 200.0, y = 300.0 },
]
tolerance = 15.0

[[exercises]]
id = "sun"
title = "Color the sun yellow"
tags = ["color"]

[exercises.config]
type = "color"
delta_e_tolerance = 20.0

[[exercises.config.regions]]
id = "sun"
bounds = { x = 250.0, y = 150.0, width = 100.0, height = 100.0 }
target_color = "#ffcc00"
"##;

const EXAMPLE_ATTEMPT: &str = r#"{
  "exercise_id": "wave",
  "strokes": {
    "strokes": [
      {
        "id": "s1",
        "points": [
          { "x": 100.0, "y": 200.0 },
          { "x": 150.0, "y": 163.0 },
          { "x": 200.0, "y": 151.0 },
          { "x": 250.0, "y": 162.0 },
          { "x": 300.0, "y": 200.0 },
          { "x": 350.0, "y": 238.0 },
          { "x": 400.0, "y": 249.0 },
          { "x": 450.0, "y": 237.0 },
          { "x": 500.0, "y": 200.0 }
        ]
      }
    ]
  }
}
"#;
