//! Integration command implementation

use anyhow::Result;

use llmterm::shell::integration_script;

/// Print the OSC 133 integration snippet for `shell`
pub fn integration_command(shell: &str) -> Result<()> {
    let script = integration_script(shell)?;
    println!("{}", script);
    Ok(())
}
