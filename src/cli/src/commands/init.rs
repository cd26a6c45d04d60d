use crate::commands::validators;
use crate::core::error::HarnessError;
use clap::{Args, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProjectType {
    #[value(name = "rest_api")]
    RestApi,
    #[value(name = "graphql")]
    Graphql,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::RestApi => write!(f, "rest_api"),
            ProjectType::Graphql => write!(f, "graphql"),
        }
    }
}

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(value_name = "NAME", help = "Project directory to create", value_parser = validators::validate_project_name)]
    pub name: String,

    #[arg(
        short = 't',
        long = "type",
        default_value_t = ProjectType::RestApi,
        value_enum,
        help = "Project template"
    )]
    pub project_type: ProjectType,

    #[arg(
        long = "path",
        default_value = ".",
        help = "Parent directory of the new project"
    )]
    pub parent: PathBuf,
}

const BASE_CONFIG: &str = r#"http:
  timeout: 30
  retry_count: 2
  retry_delay: 1
  verify_ssl: true

logging:
  level: info
  request_level: debug
  body_limit: 2048

test:
  parallel_workers: 2
  slow_threshold: 5

report:
  dir: report/data
  enabled: true
"#;

const ENV_LOCAL: &str = r#"common:
  username: [test_user]
  password: [test_password]
  tenant_id: [default]

http:
  default: https://api.example.com

auth:
  default:
    type: bearer
    login:
      path: /auth/login
      token_path: $.data.accessToken
      expires_in_path: $.data.expiresIn
"#;

const DOTENV_EXAMPLE: &str = "# Overrides use API_TEST__<SECTION>__<KEY>, for example:\n\
# API_TEST__HTTP__DEFAULT=https://staging.example.com\n\
# API_TEST__COMMON__PASSWORD=[\"change-me\"]\n";

const GITIGNORE: &str = "report/\n.env\n";

const REST_SAMPLE: &str = r#"service: default
cases:
  - name: list items
    request:
      method: GET
      path: /items
      params: { pageNo: 1, pageSize: 10 }
    expect:
      status: 200
      rules:
        - [ "$.code", eq, 0 ]
        - [ "$.data.list", is_not_null ]
  - name: create item
    request:
      method: POST
      path: /items
      body: { name: sample }
    expect:
      status: 200
      rules:
        - { path: "$.data.id", op: gt, value: 0, description: created item has an id }
"#;

const GRAPHQL_SAMPLE: &str = r#"service: default
cases:
  - name: query viewer
    request:
      method: POST
      path: /graphql
      body:
        query: "query { viewer { id name } }"
    expect:
      status: 200
      rules:
        - [ "$.errors", is_null ]
        - [ "$.data.viewer.id", is_not_null ]
"#;

/// Files of a new project, relative to its root.
fn template_files(name: &str, project_type: ProjectType) -> Vec<(&'static str, String)> {
    let sample = match project_type {
        ProjectType::RestApi => REST_SAMPLE,
        ProjectType::Graphql => GRAPHQL_SAMPLE,
    };
    vec![
        ("config/config.yml", BASE_CONFIG.to_string()),
        ("config/env_local.yml", ENV_LOCAL.to_string()),
        ("config/.env.example", DOTENV_EXAMPLE.to_string()),
        ("cases/sample.yml", sample.to_string()),
        (".gitignore", GITIGNORE.to_string()),
        ("README.md", readme(name, project_type)),
    ]
}

fn readme(name: &str, project_type: ProjectType) -> String {
    format!(
        "# {name}\n\n\
         API test project ({project_type}).\n\n\
         ## Layout\n\n\
         - `config/config.yml`: settings shared by every environment\n\
         - `config/env_<name>.yml`: per-environment service URLs, credentials and auth\n\
         - `cases/*.yml`: case suites, one service per file\n\
         - `report/data`: step records written during a run\n\n\
         ## Running\n\n\
         ```sh\n\
         apiharness run local\n\
         apiharness config show --env local\n\
         ```\n"
    )
}

pub fn execute_init(args: &InitArgs) -> Result<(), HarnessError> {
    let root = args.parent.join(&args.name);
    if root.exists() {
        return Err(HarnessError::ProjectExists(root.display().to_string()));
    }

    println!(
        "Creating new {} test project: {}",
        args.project_type, args.name
    );
    for (relative, content) in template_files(&args.name, args.project_type) {
        write_file(&root, relative, &content)?;
        log::debug!("Wrote {relative}");
    }
    fs::create_dir_all(root.join("report"))?;

    println!("Project {} created successfully!", args.name);
    println!("Next steps:");
    println!("  1. cd {}", root.display());
    println!("  2. Edit config/env_local.yml");
    println!("  3. apiharness run local");
    Ok(())
}

fn write_file(root: &Path, relative: &str, content: &str) -> Result<(), HarnessError> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(())
}
