use std::{error::Error, io, sync::Arc};

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::Terminal;
use tokio::sync::Mutex;

pub type SharedTerminal = Arc<Mutex<Terminal<CrosstermBackend<io::Stdout>>>>;

pub fn setup_terminal() -> Result<SharedTerminal, Box<dyn Error>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;

    Ok(Arc::new(Mutex::new(terminal)))
}

pub async fn restore_terminal(terminal: &SharedTerminal) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    let mut guard = terminal.lock().await;
    execute!(
        guard.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    guard.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::runtime::Runtime;

    #[test]
    fn setup_and_restore_round_trip_when_a_terminal_exists() {
        // Headless CI has no terminal to switch; only check the pairing when
        // setup succeeds.
        if let Ok(terminal) = setup_terminal() {
            let runtime = Runtime::new().expect("runtime");
            runtime.block_on(async {
                let _ = restore_terminal(&terminal).await;
            });
        }
    }
}
