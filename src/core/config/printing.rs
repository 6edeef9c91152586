use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.root {
            Some(root) => println!("  root: {}", path_display(root)),
            None => println!("  root: (data directory)"),
        }
        println!("  chat-folder: {}", self.chat_folder());
        println!("  role-folder: {}", self.role_folder());
        if self.models.is_empty() {
            println!("  models: (none set)");
        } else {
            println!("  models: {}", self.models.join(", "));
        }
        println!("  default-panel: {}", self.default_panel().as_str());
        match self.persist_expansion() {
            true => println!("  persist-expansion: on"),
            false => println!("  persist-expansion: off"),
        }
    }
}
