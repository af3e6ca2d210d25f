use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use perfume_shop_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_admin(&pool, "admin@example.com", "admin123").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO admins (id, email, password_hash, role)
        VALUES ($1, $2, $3, 'admin')
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    // If the admin already exists, keep the old password and fetch the id.
    let admin_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM admins WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured admin {email}");
    Ok(admin_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // Prices are in satang (THB minor units).
    let products: Vec<(&str, &str, i64, &str, &str, i32)> = vec![
        (
            "Coach Green",
            "Fresh and energetic scent for the modern man",
            239_000,
            "100ml",
            "Kiwi • Citrus • Fresh Woody",
            12,
        ),
        (
            "BVLGARI Omnia Amethyste",
            "Elegant floral fragrance with iris and rose",
            329_000,
            "65ml",
            "Pink Grapefruit • Iris • Solar Rose",
            8,
        ),
        (
            "BVLGARI Man Rain Essence",
            "Clean aquatic scent inspired by rainfall",
            299_000,
            "100ml",
            "Water Notes • Green Tea • White Musk",
            10,
        ),
        (
            "Chanel Chance Eau Fraiche",
            "Sparkling fresh floral with a woody trail",
            399_000,
            "100ml",
            "Citron • Jasmine • Teak Wood",
            5,
        ),
        (
            "CK Eternity for Men",
            "Timeless classic with crisp green freshness",
            219_000,
            "100ml",
            "Lavender • Mandarin • Sandalwood",
            15,
        ),
        (
            "Coach Dreams",
            "Joyful floral gourmand for everyday wear",
            259_000,
            "90ml",
            "Bitter Orange • Gardenia • Joshua Tree",
            9,
        ),
    ];

    for (name, desc, price, volume, notes, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, volume, notes, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(volume)
        .bind(notes)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
