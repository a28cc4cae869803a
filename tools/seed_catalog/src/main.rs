use dotenvy::dotenv;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::env;

fn is_dry_run() -> bool {
    !std::env::args().any(|a| a == "--apply")
}

fn catalog_path() -> String {
    std::env::args()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .unwrap_or_else(|| "catalog.json".to_string())
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default)]
    departments: Vec<DepartmentEntry>,
    #[serde(default)]
    semesters: Vec<i64>,
    #[serde(default)]
    subjects: Vec<SubjectEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
struct DepartmentEntry {
    name: String,
    code: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct SubjectEntry {
    code: String,
    name: String,
    credit: f64,
    semester: i64,
    department_code: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let base_url = env::var("BACKEND_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
    let path = catalog_path();
    let catalog: Catalog = serde_json::from_str(&std::fs::read_to_string(&path)?)?;

    let client = Client::new();
    let dry_run = is_dry_run();

    let token = if dry_run {
        None
    } else {
        let username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let password = env::var("ADMIN_PASSWORD")?;
        Some(fetch_token(&client, &base_url, &username, &password).await?)
    };

    let existing_departments: HashSet<String> = get_json(&client, &format!("{}/departments", base_url))
        .await?["departments"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|d| d["code"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut departments_created = 0;
    for department in &catalog.departments {
        if existing_departments.contains(&department.code) {
            continue;
        }
        match &token {
            None => println!("[DRY RUN] Would create department {} ({})", department.code, department.name),
            Some(token) => {
                post_admin(&client, &base_url, token, "/admin/departments", department).await?;
                println!("Created department {}", department.code);
            }
        }
        departments_created += 1;
    }

    println!(
        "Departments created: {} / {}",
        departments_created,
        catalog.departments.len()
    );

    let existing_semesters: HashSet<i64> = get_json(&client, &format!("{}/semesters", base_url))
        .await?["semesters"]
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();

    let mut semesters_created = 0;
    for number in &catalog.semesters {
        if existing_semesters.contains(number) {
            continue;
        }
        match &token {
            None => println!("[DRY RUN] Would create semester {}", number),
            Some(token) => {
                let body = serde_json::json!({ "number": number });
                post_admin(&client, &base_url, token, "/admin/semesters", &body).await?;
                println!("Created semester {}", number);
            }
        }
        semesters_created += 1;
    }

    println!(
        "Semesters created: {} / {}",
        semesters_created,
        catalog.semesters.len()
    );

    let mut subjects_created = 0;
    for subject in &catalog.subjects {
        if subject_exists(&client, &base_url, subject).await? {
            continue;
        }
        match &token {
            None => println!(
                "[DRY RUN] Would create subject {} for semester {} in {}",
                subject.code, subject.semester, subject.department_code
            ),
            Some(token) => {
                post_admin(&client, &base_url, token, "/admin/subjects", subject).await?;
                println!(
                    "Created subject {} for semester {} in {}",
                    subject.code, subject.semester, subject.department_code
                );
            }
        }
        subjects_created += 1;
    }

    println!(
        "Subjects created: {} / {}",
        subjects_created,
        catalog.subjects.len()
    );

    Ok(())
}

async fn fetch_token(
    client: &Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let res = client
        .post(format!("{}/token", base_url))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(format!("Token request failed {}: {}", status, body).into());
    }

    Ok(res.json::<TokenResponse>().await?.access_token)
}

async fn get_json(client: &Client, url: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let res = client.get(url).send().await?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(format!("GET {} failed {}: {}", url, status, body).into());
    }

    Ok(res.json::<Value>().await?)
}

/// A missing semester or department means the subject cannot exist yet.
async fn subject_exists(
    client: &Client,
    base_url: &str,
    subject: &SubjectEntry,
) -> Result<bool, Box<dyn std::error::Error>> {
    let url = format!(
        "{}/subjects/{}/{}",
        base_url, subject.semester, subject.department_code
    );
    let res = client.get(&url).send().await?;

    if res.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(false);
    }
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(format!("GET {} failed {}: {}", url, status, body).into());
    }

    let body: Value = res.json().await?;
    Ok(body["subjects"]
        .as_array()
        .map(|items| items.iter().any(|s| s["code"] == subject.code.as_str()))
        .unwrap_or(false))
}

async fn post_admin<T: Serialize + ?Sized>(
    client: &Client,
    base_url: &str,
    token: &str,
    path: &str,
    body: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    let res = client
        .post(format!("{}{}", base_url, path))
        .header("Authorization", format!("Bearer {}", token))
        .json(body)
        .send()
        .await?;

    if !res.status().is_success() {
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        return Err(format!("POST {} failed {}: {}", path, status, text).into());
    }

    Ok(())
}
