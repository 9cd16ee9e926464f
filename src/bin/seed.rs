//! Populates an empty database with the demo catalog, a default admin
//! account and the settings singleton. Idempotent: does nothing when
//! categories already exist.

use bigdecimal::BigDecimal;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use vitrine::db::connection::init_pool;
use vitrine::db::models::NewUser;
use vitrine::db::repository;
use vitrine::error::ApiError;

struct CategorySeed {
    name: &'static str,
    icon: &'static str,
    subcategories: &'static [&'static str],
}

const CATEGORIES: &[CategorySeed] = &[
    CategorySeed {
        name: "Ordinateurs",
        icon: "laptop",
        subcategories: &[
            "Ordinateurs portables",
            "Ordinateurs de bureau",
            "Mini PC",
        ],
    },
    CategorySeed {
        name: "Composants",
        icon: "memory",
        subcategories: &["Processeurs", "Cartes mères", "Mémoire RAM"],
    },
    CategorySeed {
        name: "Imprimantes",
        icon: "print",
        subcategories: &[
            "Imprimantes laser",
            "Imprimantes jet d'encre",
            "Imprimantes multifonctions",
        ],
    },
    CategorySeed {
        name: "Accessoires",
        icon: "devices",
        subcategories: &[
            "Claviers et souris",
            "Webcams et microphones",
            "Casques audio",
        ],
    },
];

// (subcategory, name, brand, price in FCFA, description)
const PRODUCTS: &[(&str, &str, &str, i64, &str)] = &[
    (
        "Ordinateurs portables",
        "HP Pavilion 15",
        "HP",
        450_000,
        "Ordinateur portable performant avec écran 15.6\", Intel Core i5, 8Go RAM, 512Go SSD.",
    ),
    (
        "Ordinateurs portables",
        "Dell Latitude 5420",
        "Dell",
        520_000,
        "PC professionnel robuste, Intel Core i7, 16Go RAM, 1To SSD.",
    ),
    (
        "Ordinateurs portables",
        "Lenovo ThinkPad E15",
        "Lenovo",
        380_000,
        "Ordinateur portable fiable pour entreprises, AMD Ryzen 5, 8Go RAM, 256Go SSD.",
    ),
    (
        "Ordinateurs de bureau",
        "HP EliteDesk 800 G6",
        "HP",
        480_000,
        "PC de bureau compact et puissant, Intel Core i7, 16Go RAM, 512Go SSD.",
    ),
    (
        "Mini PC",
        "Intel NUC 11",
        "Intel",
        280_000,
        "Mini PC ultra-compact, Intel Core i5, 8Go RAM, 256Go SSD.",
    ),
    (
        "Processeurs",
        "Intel Core i5-12400",
        "Intel",
        95_000,
        "Processeur 6 cœurs, 12 threads, fréquence 2.5GHz, socket LGA1700.",
    ),
    (
        "Processeurs",
        "AMD Ryzen 5 5600X",
        "AMD",
        105_000,
        "Processeur 6 cœurs, 12 threads, fréquence 3.7GHz, socket AM4.",
    ),
    (
        "Cartes mères",
        "Asus Prime B550M-A",
        "Asus",
        65_000,
        "Carte mère Micro-ATX, socket AM4, chipset B550, support PCIe 4.0.",
    ),
    (
        "Mémoire RAM",
        "Corsair Vengeance 16Go",
        "Corsair",
        35_000,
        "Kit 2x8Go DDR4 3200MHz, compatible Intel et AMD.",
    ),
    (
        "Imprimantes laser",
        "HP LaserJet Pro M404",
        "HP",
        185_000,
        "Imprimante laser monochrome, vitesse 38ppm, recto-verso automatique.",
    ),
    (
        "Imprimantes jet d'encre",
        "Epson EcoTank L3250",
        "Epson",
        125_000,
        "Imprimante multifonction à réservoirs, économie d'encre, WiFi.",
    ),
    (
        "Imprimantes multifonctions",
        "HP OfficeJet Pro 9025e",
        "HP",
        215_000,
        "Tout-en-un professionnel, couleur, fax, chargeur automatique.",
    ),
    (
        "Claviers et souris",
        "Logitech MK270",
        "Logitech",
        18_000,
        "Combo clavier et souris sans fil, autonomie longue durée.",
    ),
    (
        "Webcams et microphones",
        "Logitech C920 HD Pro",
        "Logitech",
        58_000,
        "Webcam Full HD 1080p, micro stéréo, autofocus.",
    ),
    (
        "Casques audio",
        "Sony WH-1000XM4",
        "Sony",
        185_000,
        "Casque sans fil, réduction de bruit active, autonomie 30h.",
    ),
];

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

fn seed(conn: &mut PgConnection) -> Result<(), ApiError> {
    if !repository::get_all_categories(conn)?.is_empty() {
        log::info!("categories already present, nothing to seed");
        return Ok(());
    }

    for seed in CATEGORIES {
        let parent = repository::create_category(
            conn,
            seed.name.to_string(),
            Some(seed.icon.to_string()),
            None,
            None,
        )?;
        log::info!("category created: {}", parent.name);
        for sub in seed.subcategories {
            repository::create_category(conn, sub.to_string(), None, None, Some(parent.id))?;
        }
    }

    let all = repository::get_all_categories(conn)?;
    let mut created = 0usize;
    for (i, (subcategory, name, brand, price, description)) in PRODUCTS.iter().enumerate() {
        let category = all
            .iter()
            .find(|c| c.name == *subcategory)
            .ok_or_else(|| ApiError::Validation(format!("unknown category {}", subcategory)))?;
        repository::create_product(
            conn,
            repository::NewProductData {
                name: name.to_string(),
                description: description.to_string(),
                price: BigDecimal::from(*price),
                brand: brand.to_string(),
                image: None,
                category_id: category.id,
                in_stock: true,
                // Every third product goes on the storefront carousel.
                featured: i % 3 == 0,
            },
        )?;
        created += 1;
    }
    log::info!("{} products created", created);

    repository::load_site_settings(conn)?;

    repository::create_user(
        conn,
        NewUser {
            username: "admin".to_string(),
            password: "admin".to_string(),
            role: "Admin".to_string(),
        },
    )?;
    log::info!("default admin account created");

    Ok(())
}

fn main() {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let pool = init_pool();
    let mut conn = pool.get().expect("Failed to get connection from pool");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
    if let Err(e) = seed(&mut conn) {
        log::error!("seeding failed: {}", e);
        std::process::exit(1);
    }
    log::info!("seeding done");
}
