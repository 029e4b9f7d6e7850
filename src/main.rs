use anyhow::{bail, Context};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::error::Error as _;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use treasury_query::executor::run;
use treasury_query::{
    CompilerConfig, FacetEngine, QueryCompiler, QueryConfig, QueryError, SchemaConfig,
    SchemaRegistry, SqliteExecutor, StaticSchema,
};

/// Compile dashboard query descriptions and optionally run them against SQLite.
#[derive(Parser, Debug)]
#[command(name = "treasury-query", version)]
struct Args {
    /// JSON schema file with `tables` and optional `compiler` settings.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// SQLite database to execute against. Its tables are used as the schema
    /// when `--schema` is not given.
    #[arg(long)]
    db: Option<PathBuf>,
}

enum Flow {
    Continue,
    Quit,
}

struct Session {
    schema: StaticSchema,
    compiler: QueryCompiler,
    executor: Option<SqliteExecutor>,
}

impl Session {
    fn open(args: &Args) -> anyhow::Result<Self> {
        let executor = args.db.as_ref().map(SqliteExecutor::open).transpose()?;

        let (schema, compiler_config) = match (&args.schema, &executor) {
            (Some(path), _) => {
                let config = SchemaConfig::from_json_file(path)?;
                (config.tables, config.compiler)
            }
            (None, Some(executor)) => (executor.introspect_schema()?, CompilerConfig::default()),
            (None, None) => bail!("either --schema or --db is required"),
        };

        info!(tables = schema.len(), execute = executor.is_some(), "session ready");
        Ok(Self {
            schema,
            compiler: QueryCompiler::from_config(compiler_config),
            executor,
        })
    }

    fn handle(&self, line: &str) -> anyhow::Result<Flow> {
        match line {
            ":quit" | ":q" => return Ok(Flow::Quit),
            ":tables" => {
                self.print_tables();
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        if let Some(rest) = line.strip_prefix(":facets") {
            let (targets, json) = rest
                .trim_start()
                .split_once(char::is_whitespace)
                .context("usage: :facets col1,col2 <query json>")?;
            let targets: Vec<String> = targets
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            let query: QueryConfig = serde_json::from_str(json.trim()).context("invalid query JSON")?;
            self.facets(&query, &targets);
            return Ok(Flow::Continue);
        }

        let query: QueryConfig = serde_json::from_str(line).context("invalid query JSON")?;
        self.query(&query);
        Ok(Flow::Continue)
    }

    fn print_tables(&self) {
        for name in self.schema.table_names() {
            let columns = self.schema.table_columns(&name).unwrap_or_default();
            println!("  {} ({})", name, columns.join(", "));
        }
    }

    fn query(&self, query: &QueryConfig) {
        let compiled = match self.compiler.compile(query, &self.schema) {
            Ok(compiled) => compiled,
            Err(e) => return report(&e),
        };
        println!("\n[SQL]:\n{}", compiled.statement);
        println!("[params]: {:?}", compiled.params);

        let Some(executor) = &self.executor else {
            return;
        };
        match run(executor, &compiled.statement, &compiled.params) {
            Ok(rows) => {
                for row in &rows {
                    println!("{}", serde_json::Value::Object(row.clone()));
                }
                println!("✓ {} rows", rows.len());
            }
            Err(e) => report(&e),
        }
    }

    fn facets(&self, query: &QueryConfig, targets: &[String]) {
        let engine = FacetEngine::new(self.compiler.clone());

        let Some(executor) = &self.executor else {
            // Without a database, show what would run.
            for target in targets {
                match engine.compile_facet(query, target, &self.schema) {
                    Ok(compiled) => println!("[{}]: {}  {:?}", target, compiled.statement, compiled.params),
                    Err(e) => report(&e),
                }
            }
            return;
        };

        match engine.compute(query, targets, &self.schema, executor) {
            Ok(facets) => {
                for target in targets {
                    println!("[{}]:", target);
                    for facet in facets.get(target).into_iter().flatten() {
                        println!("  {} → {}", facet.value, facet.count);
                    }
                }
            }
            Err(e) => report(&e),
        }
    }
}

fn report(err: &QueryError) {
    println!("✗ {} ({}): {}", err.kind(), err.status_code(), err);
    if let Some(source) = err.source() {
        println!("  caused by: {:#}", source);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let session = Session::open(&args)?;

    println!("--- Treasury Query: query description to SQL compiler ---");
    println!("Enter a query JSON, `:facets col1,col2 <query json>`, `:tables` or `:quit`.");

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("query> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();
                match session.handle(line) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => println!("✗ {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
