// src/config.rs

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        DashboardRepository, InMemoryStore, MovementRepository, PgDashboardRepository,
        PgInventoryRepository, PgRequisitionRepository, PgSectorRepository, PgUserRepository,
        RequisitionRepository, SectorRepository, StockRepository, UserRepository,
    },
    services::{
        auth::AuthService, dashboard_service::DashboardService,
        inventory_service::InventoryService, requisition_service::RequisitionService,
        user_service::UserService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub auth: AuthSettings,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Lê a configuração das variáveis de ambiente (com `.env`, se existir).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // Variável vazia conta como ausente
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let storage = match get("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => bail!("STORAGE_BACKEND inválido: '{}' (use 'postgres' ou 'memory')", other),
        };

        let database_url = get("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL deve ser definida");
        }

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v.parse().context("DATABASE_MAX_CONNECTIONS deve ser um número")?,
            None => 10,
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match get("PORT") {
            Some(v) => v.parse().context("PORT deve ser um número")?,
            None => 3001,
        };
        let bind_addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("Endereço inválido: {}:{}", host, port))?;

        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let token_ttl_hours = match get("JWT_TTL_HOURS") {
            Some(v) => v.parse().context("JWT_TTL_HOURS deve ser um número")?,
            None => 12,
        };
        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(v) => v.parse().context("BCRYPT_COST deve ser um número")?,
            None => bcrypt::DEFAULT_COST,
        };

        let bootstrap_admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                name: get("ADMIN_NAME").unwrap_or_else(|| "Administrador".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            storage,
            database_url,
            max_connections,
            bind_addr,
            auth: AuthSettings { jwt_secret, token_ttl_hours, bcrypt_cost },
            bootstrap_admin,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub inventory_service: InventoryService,
    pub requisition_service: RequisitionService,
    pub dashboard_service: DashboardService,
}

/// Os repositórios já escolhidos (Postgres ou memória).
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub sectors: Arc<dyn SectorRepository>,
    pub stock: Arc<dyn StockRepository>,
    pub movements: Arc<dyn MovementRepository>,
    pub requisitions: Arc<dyn RequisitionRepository>,
    pub dashboard: Arc<dyn DashboardRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let inventory = Arc::new(PgInventoryRepository::new(pool.clone()));
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            sectors: Arc::new(PgSectorRepository::new(pool.clone())),
            stock: inventory.clone(),
            movements: inventory,
            requisitions: Arc::new(PgRequisitionRepository::new(pool.clone())),
            dashboard: Arc::new(PgDashboardRepository::new(pool)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            sectors: store.clone(),
            stock: store.clone(),
            movements: store.clone(),
            requisitions: store.clone(),
            dashboard: store,
        }
    }
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let repositories = match config.storage {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                // Conecta ao banco de dados, usando '?' para propagar erros
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                // Faz o app rodar as migrações do SQLx na inicialização
                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;

                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
                Repositories::postgres(db_pool)
            }
            StorageBackend::Memory => {
                tracing::warn!("⚠️ Armazenamento em memória: os dados somem ao reiniciar.");
                Repositories::in_memory(InMemoryStore::with_default_sectors().await?)
            }
        };

        Ok(Self::from_repositories(repositories, config.auth.clone()))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_repositories(repos: Repositories, auth: AuthSettings) -> Self {
        let auth_service = AuthService::new(repos.users.clone(), auth);
        let user_service = UserService::new(repos.users, auth_service.clone());
        let inventory_service = InventoryService::new(repos.stock.clone(), repos.movements);
        let requisition_service = RequisitionService::new(repos.requisitions.clone(), repos.sectors);
        let dashboard_service = DashboardService::new(repos.dashboard, repos.requisitions, repos.stock);

        Self {
            auth_service,
            user_service,
            inventory_service,
            requisition_service,
            dashboard_service,
        }
    }
}
