use std::sync::Arc;
use std::time::SystemTime;

use bonsai::*;

// Define regular traits and implementor structs

trait Logger: Send + Sync {
    fn log(&self, content: &str);
}

struct StdoutLogger;

impl Logger for StdoutLogger {
    fn log(&self, content: &str) {
        println!("{content}");
    }
}

fn logger_token() -> Token {
    Token::of::<Arc<dyn Logger>>()
}

struct Clock {
    logger: Arc<dyn Logger>,
}

impl Constructible for Clock {
    fn construct() -> Result<Self, InjectError> {
        // Trait objects are stored behind their own Arc inside the dynamic
        // value, so clone the inner handle out.
        let logger = inject_as::<Arc<dyn Logger>>(&logger_token())?;
        Ok(Self {
            logger: Arc::clone(&*logger),
        })
    }
}

impl Clock {
    fn log_date(&self) {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        self.logger.log(&format!("{}s since epoch", now.as_secs()));
    }
}

// A scope-bound composite: it gets its own child injector, seeded with a
// recipe visible only to this instance and its descendants.

struct App {
    clock: Arc<Clock>,
}

impl ScopeBound for App {
    fn local_recipes() -> Vec<Recipe> {
        vec![Recipe::class::<Clock>()]
    }

    fn construct() -> Result<Self, InjectError> {
        Ok(Self {
            clock: inject_as::<Clock>(&Token::of::<Clock>())?,
        })
    }
}

fn main() -> Result<(), InjectError> {
    // App-wide recipes live at the root injector.
    let logger: Arc<dyn Logger> = Arc::new(StdoutLogger);
    root().provide(Recipe::value(logger_token(), logger));

    let app = Scope::<App>::build()?;
    app.instance().clock.log_date();

    // The clock recipe was local to the app's scope.
    assert!(root()
        .get(&Token::of::<Clock>(), GetOptions::default().optional())?
        .is_none());
    Ok(())
}
