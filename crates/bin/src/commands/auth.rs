//! Account commands: login, logout, whoami, register.

use byline::{
    SessionManager,
    http::types::{Credentials, RegisterData},
};

use crate::cli::{LoginArgs, RegisterArgs};

pub async fn login(
    session: &SessionManager,
    args: LoginArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    session.initialize().await?;
    match session
        .login(Credentials {
            username: args.email,
            password: args.password,
        })
        .await
    {
        Ok(user) => {
            println!("Logged in as {} <{}>", user.username, user.email);
            Ok(())
        }
        Err(err) if err.is_invalid_credentials() => {
            eprintln!("Login failed: {err}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(session: &SessionManager) -> Result<(), Box<dyn std::error::Error>> {
    session.logout()?;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(session: &SessionManager) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = session.initialize().await?;
    match snapshot.user() {
        Some(user) => {
            println!("{} <{}>", user.username, user.email);
            if let Some(bio) = &user.bio {
                println!("{bio}");
            }
            Ok(())
        }
        None => {
            eprintln!("Not logged in");
            std::process::exit(1);
        }
    }
}

pub async fn register(
    session: &SessionManager,
    args: RegisterArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let receipt = session
        .register(RegisterData {
            username: args.username,
            email: args.email,
            password: args.password,
        })
        .await?;
    println!("{}", receipt.message);
    Ok(())
}
