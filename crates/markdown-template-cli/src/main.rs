use std::process;

fn main() {
    match markdown_template_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("markdown-template error: {err:#}");
            process::exit(1);
        }
    }
}
