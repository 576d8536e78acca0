use std::process::Command;

/// Run `date` with the given format, falling back to "unknown" on hosts without it.
fn date_field(format: &str) -> String {
	Command::new("date")
		.arg(format)
		.output()
		.ok()
		.map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
		.filter(|s| !s.is_empty())
		.unwrap_or_else(|| "unknown".to_string())
}

fn main() {
	println!("cargo:rustc-env=COMPILE_DATE={}", date_field("+%Y-%m-%d"));
	println!("cargo:rustc-env=COMPILE_TIME={}", date_field("+%H:%M:%S"));
}
