use anyhow::{Context, Error};
use coursehub::{
    cookie::AuthCookie,
    endpoints::{self, CourseQuery, Credentials, Registration},
    notify::{LogNotifier, Notifier},
    router::{self, Route, Router},
    ApiClient, Config, CourseId, CourseSelection, FileStorage, Record,
    Session,
};
use std::{
    path::PathBuf,
    time::{Duration, SystemTime},
};
use structopt::StructOpt;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::from_args();

    let config = Config::new(&args.base_url)
        .context("Invalid base URL")?
        .with_timeout(Duration::from_secs(args.timeout_secs));
    log::debug!("Using {:#?}", config);

    let api = ApiClient::new(&config)?;

    // pick up wherever the last invocation left off
    let mut session = Session::new(FileStorage::new(&args.state_dir));
    session.init_user_info()?;

    let mut app = App {
        api,
        session,
        router: Router::new(),
        selection: CourseSelection::new(),
        notifier: LogNotifier,
    };

    if let Err(e) = app.run(args.command).await {
        app.notifier.error(&e, Some(&e));
        std::process::exit(1);
    }

    Ok(())
}

struct App {
    api: ApiClient,
    session: Session,
    router: Router,
    selection: CourseSelection,
    notifier: LogNotifier,
}

impl App {
    async fn run(&mut self, command: Command) -> Result<(), Error> {
        match command {
            Command::Login { username, password } => {
                let credentials = Credentials::new(username, password);
                let token =
                    endpoints::login(&self.api, &self.session, &credentials)
                        .await?;
                self.session
                    .set_token(&token)
                    .context("The server handed out an unreadable token")?;

                let user = self.session.user_info();
                self.notifier.success(format!(
                    "Logged in as {} (#{})",
                    user.username, user.user_id
                ));
            },
            Command::Register {
                username,
                password,
                email,
            } => {
                let registration = Registration {
                    credentials: Credentials::new(username, password),
                    email,
                };
                endpoints::register(&self.api, &self.session, &registration)
                    .await?;
                self.notifier.success("Registered, you can now log in");
            },
            Command::Logout => {
                self.session.clear_token()?;
                self.notifier.info("Logged out");
            },
            Command::Status => self.status()?,
            Command::Profile => {
                self.visit("/profile")?;
                let profile =
                    endpoints::get_profile(&self.api, &self.session).await?;
                print(&profile)?;
            },
            Command::Categories => {
                self.visit(router::LANDING_PATH)?;
                let categories =
                    endpoints::get_categories(&self.api, &self.session)
                        .await?;
                print(&categories)?;
            },
            Command::Courses(filter) => {
                self.visit(router::LANDING_PATH)?;
                let courses = endpoints::get_courses(
                    &self.api,
                    &self.session,
                    &filter.into(),
                )
                .await?;
                print(&courses)?;
            },
            Command::Course { id, graph } => {
                self.visit(&Route::CourseDetail(id.clone()).path())?;
                let course =
                    endpoints::get_course(&self.api, &self.session, &id)
                        .await?;
                print(&course)?;

                if graph {
                    self.selection.set_current_course(course);
                    self.show_selected_graph(&id).await?;
                }
            },
            Command::Recommend => {
                self.visit("/recommend")?;
                let courses =
                    endpoints::get_recommendations(&self.api, &self.session)
                        .await?;
                print(&courses)?;
            },
            Command::Graph { course_id } => {
                self.visit("/graph")?;
                let graph = endpoints::get_knowledge_graph(
                    &self.api,
                    &self.session,
                    &course_id,
                )
                .await?;
                print(&graph)?;
            },
            Command::Progress { course_id } => {
                self.visit("/dashboard")?;
                let progress = endpoints::get_progress(
                    &self.api,
                    &self.session,
                    course_id.as_ref(),
                )
                .await?;
                print(&progress)?;
            },
            Command::Ability => {
                self.visit("/dashboard")?;
                let radar =
                    endpoints::get_ability_radar(&self.api, &self.session)
                        .await?;
                print(&radar)?;
            },
            Command::AdminUsers => {
                self.visit("/admin/users")?;
                let users =
                    endpoints::admin_list_users(&self.api, &self.session)
                        .await?;
                print(&users)?;
            },
            Command::AdminCourses(filter) => {
                self.visit("/admin/course")?;
                let courses = endpoints::admin_list_courses(
                    &self.api,
                    &self.session,
                    &filter.into(),
                )
                .await?;
                print(&courses)?;
            },
            Command::AdminCreateCourse { course } => {
                self.visit("/admin/course/register")?;
                let course: Record = serde_json::from_str(&course)
                    .context("The course should be a JSON object")?;
                let created = endpoints::admin_create_course(
                    &self.api,
                    &self.session,
                    &course,
                )
                .await?;
                self.notifier.success("Course created");
                print(&created)?;
            },
            Command::AdminUpdateCourse { id, course } => {
                self.visit(&Route::AdminCourseEdit(id.clone()).path())?;
                let course: Record = serde_json::from_str(&course)
                    .context("The course should be a JSON object")?;
                let updated = endpoints::admin_update_course(
                    &self.api,
                    &self.session,
                    &id,
                    &course,
                )
                .await?;
                self.notifier.success(format!("Course {} updated", id));
                print(&updated)?;
            },
            Command::AdminDeleteCourse { id } => {
                self.visit("/admin/course")?;
                endpoints::admin_delete_course(&self.api, &self.session, &id)
                    .await?;
                self.notifier.success(format!("Course {} deleted", id));
            },
            Command::Navigate { path } => {
                let route = self.router.navigate(&mut self.session, &path)?;
                println!("{} => {} ({})", path, route.path(), route.name());
            },
            Command::Cookie { minutes } => {
                let cookie = match self.session.token() {
                    Some(token) => {
                        AuthCookie::new(token, minutes, SystemTime::now())
                    },
                    None => AuthCookie::clear(),
                };
                println!("{}", cookie);
            },
        }

        Ok(())
    }

    /// Go to `path`, refusing to continue if the guard sends us elsewhere.
    fn visit(&mut self, path: &str) -> Result<(), Error> {
        let wanted = Route::resolve(&router::normalize(path));
        let got = self.router.navigate(&mut self.session, path)?;

        if got != wanted {
            anyhow::bail!(
                "Not allowed to view {}, redirected to {}",
                wanted.path(),
                got.path()
            );
        }

        Ok(())
    }

    async fn show_selected_graph(&mut self, fallback: &CourseId) -> Result<(), Error> {
        self.visit("/graph")?;

        let course = self.selection.take_current_course();
        let id = course
            .as_ref()
            .and_then(|c| c.get("id"))
            .map(|id| match id {
                Record::String(s) => CourseId::from(s.as_str()),
                other => CourseId::from(other.to_string()),
            })
            .unwrap_or_else(|| fallback.clone());

        let graph =
            endpoints::get_knowledge_graph(&self.api, &self.session, &id)
                .await?;
        print(&graph)
    }

    fn status(&mut self) -> Result<(), Error> {
        if self.session.expire_if_stale()? {
            self.notifier.warn("Your session has expired, please log in again");
        }

        if !self.session.is_logged_in() {
            println!("Not logged in");
            return Ok(());
        }

        let user = self.session.user_info();
        let role = user.role.as_ref().map(|r| r.as_str()).unwrap_or("");
        println!("Logged in as {} (#{}, {})", user.username, user.user_id, role);
        if let Some(exp) = self.session.expires_at() {
            println!("Token expires at {} (Unix time)", exp);
        }

        Ok(())
    }
}

fn print(record: &Record) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Talk to a CourseHub server from the command line")]
struct Args {
    #[structopt(
        long = "base-url",
        default_value = "http://localhost:8080",
        help = "Where the CourseHub server lives"
    )]
    base_url: String,
    #[structopt(
        long = "timeout-secs",
        default_value = "5",
        help = "How long to wait for each request"
    )]
    timeout_secs: u64,
    #[structopt(
        long = "state-dir",
        default_value = ".coursehub",
        parse(from_os_str),
        help = "Where to keep the login token between runs"
    )]
    state_dir: PathBuf,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(about = "Log in and remember the session")]
    Login {
        #[structopt(short = "u", long = "username", help = "Your username")]
        username: String,
        #[structopt(short = "p", long = "password", help = "Your password")]
        password: String,
    },
    #[structopt(about = "Create a new account")]
    Register {
        #[structopt(short = "u", long = "username")]
        username: String,
        #[structopt(short = "p", long = "password")]
        password: String,
        #[structopt(long = "email")]
        email: Option<String>,
    },
    #[structopt(about = "Forget the saved session")]
    Logout,
    #[structopt(about = "Show who is logged in")]
    Status,
    Profile,
    Categories,
    #[structopt(about = "Search the course catalog")]
    Courses(Filter),
    #[structopt(about = "Show a single course")]
    Course {
        id: CourseId,
        #[structopt(long = "graph", help = "Also show its knowledge graph")]
        graph: bool,
    },
    Recommend,
    #[structopt(about = "Show a course's knowledge graph")]
    Graph {
        #[structopt(long = "course-id")]
        course_id: CourseId,
    },
    Progress {
        #[structopt(long = "course-id")]
        course_id: Option<CourseId>,
    },
    #[structopt(about = "Show the ability radar")]
    Ability,
    AdminUsers,
    AdminCourses(Filter),
    #[structopt(about = "Create a course from a JSON object")]
    AdminCreateCourse { course: String },
    #[structopt(about = "Replace a course with a JSON object")]
    AdminUpdateCourse { id: CourseId, course: String },
    AdminDeleteCourse { id: CourseId },
    #[structopt(about = "See where the router would take you")]
    Navigate { path: String },
    #[structopt(about = "Print a Set-Cookie value mirroring the token")]
    Cookie {
        #[structopt(long = "minutes", default_value = "30")]
        minutes: u64,
    },
}

#[derive(Debug, StructOpt)]
struct Filter {
    #[structopt(long = "keyword")]
    keyword: Option<String>,
    #[structopt(long = "category")]
    category: Option<i64>,
    #[structopt(long = "page")]
    page: Option<u32>,
    #[structopt(long = "size")]
    size: Option<u32>,
}

impl From<Filter> for CourseQuery {
    fn from(f: Filter) -> CourseQuery {
        CourseQuery {
            keyword: f.keyword,
            category_id: f.category,
            page_num: f.page,
            page_size: f.size,
        }
    }
}
