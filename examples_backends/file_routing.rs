use std::io;

use tracing_leveled_sink::config::ServiceConfig;
use tracing_leveled_sink::global;
use tracing_leveled_sink::init::init_logger;
use tracing_leveled_sink::record::Field;

const CONF: &str = "
project:
  name: foo
app:
  name: bar
log:
  level: info
  console_enable: true
";

/// Route records into `<tmp>/staging/foo/bar/{debug,info,warn,error}.log`
/// and mirror info and above to stdout.
fn main() {
    let service = match ServiceConfig::from_yaml_str(CONF) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("bad configuration: {err}");
            return;
        }
    };
    let mut config = service.logger_config("staging");
    config.log_dir = std::env::temp_dir().join("leveled-example");

    init_logger(&config);

    global::debug("cache warmed", &[Field::new("entries", 512)]);
    global::info("listening", &[Field::new("port", 8080)]);
    global::warn("slow upstream", &[Field::string("upstream", "billing")]);
    global::error("request failed", &io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"));

    global::current().flush();
    for (severity, path) in config.destination_paths() {
        println!("{severity:>5} -> {}", path.display());
    }
}
