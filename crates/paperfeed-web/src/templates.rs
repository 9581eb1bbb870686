//! Page templates, compiled into the binary.

use minijinja::Environment;

const LAYOUT_HTML: &str = include_str!("../templates/layout.html");
const INDEX_HTML: &str = include_str!("../templates/index.html");
const HISTORY_HTML: &str = include_str!("../templates/history.html");

pub const INDEX: &str = "index.html";
pub const HISTORY: &str = "history.html";

pub fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("layout.html", LAYOUT_HTML)?;
    env.add_template(INDEX, INDEX_HTML)?;
    env.add_template(HISTORY, HISTORY_HTML)?;
    Ok(env)
}
