//! OSC 133 integration snippets, meant to be sourced from the shell rc file.
//!
//! Every snippet emits `D;<exit>` and `A` before the prompt, `B` at the end of
//! the prompt, and `C` just before a command runs.

use anyhow::{Result, bail};

pub const SUPPORTED_SHELLS: &[&str] = &["zsh", "bash", "fish"];

const ZSH: &str = r#"
# llmterm shell integration for zsh
__llmterm_precmd() {
    local ret=$?
    printf '\033]133;D;%d\007' "$ret"
    printf '\033]133;A\007'
}

__llmterm_preexec() {
    printf '\033]133;C\007'
}

autoload -Uz add-zsh-hook
add-zsh-hook precmd __llmterm_precmd
add-zsh-hook preexec __llmterm_preexec

if [[ "$PS1" != *'133;B'* ]]; then
    PS1="${PS1}%{"$'\e]133;B\a'"%}"
fi
"#;

const BASH: &str = r#"
# llmterm shell integration for bash
__llmterm_precmd() {
    local ret=$?
    printf '\033]133;D;%d\007' "$ret"
    printf '\033]133;A\007'
}

if [[ "$PS1" != *'133;B'* ]]; then
    PS1="${PS1}\[\033]133;B\007\]"
fi

# PS0 is printed after a command is read, before it runs (bash 4.4+)
if [[ "$PS0" != *'133;C'* ]]; then
    PS0="\033]133;C\007${PS0}"
fi

PROMPT_COMMAND="__llmterm_precmd${PROMPT_COMMAND:+; $PROMPT_COMMAND}"
"#;

const FISH: &str = r#"
# llmterm shell integration for fish
function __llmterm_precmd --on-event fish_prompt
    set -l last_status $status
    printf '\033]133;D;%d\007' $last_status
    printf '\033]133;A\007'
end

function __llmterm_preexec --on-event fish_preexec
    printf '\033]133;C\007'
end

if not functions -q __llmterm_orig_fish_prompt
    functions -c fish_prompt __llmterm_orig_fish_prompt
    function fish_prompt
        __llmterm_orig_fish_prompt
        printf '\033]133;B\007'
    end
end
"#;

/// Integration snippet for `shell`.
pub fn integration_script(shell: &str) -> Result<&'static str> {
    match shell {
        "zsh" => Ok(ZSH),
        "bash" => Ok(BASH),
        "fish" => Ok(FISH),
        other => bail!(
            "unsupported shell: {} (supported: {})",
            other,
            SUPPORTED_SHELLS.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_script_emits_all_markers() {
        for shell in SUPPORTED_SHELLS {
            let script = integration_script(shell).unwrap();
            for marker in ["133;D;", "133;A", "133;B", "133;C"] {
                assert!(
                    script.contains(marker),
                    "{} script is missing {}",
                    shell,
                    marker
                );
            }
        }
    }

    #[test]
    fn test_unknown_shell_lists_supported() {
        let err = integration_script("tcsh").unwrap_err().to_string();
        assert!(err.contains("unsupported shell: tcsh"));
        assert!(err.contains("zsh, bash, fish"));
    }
}
