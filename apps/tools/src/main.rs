use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::DepartmentId;
use storage::{NewFaculty, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://directory.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateDepartment {
        name: String,
    },
    CreateFaculty {
        department_id: i64,
        name: String,
        #[arg(long, default_value = "")]
        designation: String,
        #[arg(long)]
        qualification: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        profile_link: Option<String>,
    },
    ListDepartments,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateDepartment { name } => {
            let department_id = storage.create_department(&name).await?;
            println!("created department_id={department_id}");
        }
        Command::CreateFaculty {
            department_id,
            name,
            designation,
            qualification,
            email,
            phone,
            profile_link,
        } => {
            let faculty_id = storage
                .create_faculty(&NewFaculty {
                    name,
                    designation,
                    qualification,
                    email,
                    phone,
                    profile_link,
                    department_id: DepartmentId(department_id),
                })
                .await?;
            println!("created faculty_id={faculty_id}");
        }
        Command::ListDepartments => {
            for department in storage.list_departments().await? {
                println!("{}\t{}", department.department_id, department.department_name);
            }
        }
    }

    Ok(())
}
